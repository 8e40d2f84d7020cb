mod blob;
mod errors;
mod pack;
mod value;

pub use blob::{decode_session_map, encode_session_map};
pub use errors::CodecError;
pub use pack::{pack_ids, unpack_ids};
pub use value::{Scalar, SessionValue};
