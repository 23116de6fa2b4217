//! Bit-exact (de)serialization of points, requests and responses, plus the
//! stable ordering comparators used to merge streams from multiple shards.

pub mod codec;
pub mod error;
pub mod field_value;
pub mod point;
pub mod request;
pub mod response;
pub mod series;

pub use codec::{Decode, Encode};
pub use error::Error;
pub use field_value::FieldValue;
pub use point::{cmp_by_time_asc, cmp_by_time_desc, Point};
pub use request::{Request, RequestKind};
pub use response::{Response, ResponseKind};
pub use series::Series;
