//! Value representation shared by the front-end: logical types, scalar
//! values, schemas, row blocks and the row wire format.
pub mod datatype;
pub mod errors;
pub mod row;
pub mod scalar;
pub mod schema;
pub mod wire;
