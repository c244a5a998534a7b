mod codec;

pub use codec::{decode, encode, CursorFields};
