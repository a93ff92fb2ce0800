//! Per-visit shopping state: the hydrated library, the current selection
//! and the cart. Changes are broadcast as [`SessionEvent`]s.

pub mod cart;
#[allow(clippy::module_inception)]
pub mod session;

pub use cart::{Cart, CartItem};
pub use session::{Session, SessionError, SessionEvent};
