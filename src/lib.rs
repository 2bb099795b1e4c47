pub mod conditions;
pub mod fields;
pub mod record;
pub mod shape;
pub mod value;

pub use conditions::Condition;
pub use fields::FieldName;
pub use record::Record;
pub use shape::Shape;
pub use value::Value;
