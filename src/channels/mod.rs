//! Channel bookkeeping
//!
//! A simulation propagates a set of optical channels: signals, co- and
//! counter-propagating pumps, ASE bins and Raman Stokes bins. Each channel
//! occupies one row of the power matrix. Rows are grouped by
//! [`ChannelCategory`] in a fixed order and the [`SliceMap`] gives the index
//! range of every group.
//!
//! ```text
//! row:  0 ........ s | s ...... p | ... | ............... n
//!       signals      | co-pumps   | ... | backward Raman
//! ```
//!
//! - [`OpticalChannel`]: one channel, its coefficients frozen at creation
//! - [`Channels`]: the registry filled by the `add_*` calls
//! - [`SliceMap`]: category → row range

mod channel;
mod registry;
mod slices;

pub use channel::{Direction, OpticalChannel};
pub use registry::Channels;
pub use slices::{ChannelCategory, SliceMap};
