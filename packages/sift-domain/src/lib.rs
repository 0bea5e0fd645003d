pub mod document;
pub mod intent;
pub mod message;
pub mod normalize;
pub mod react_protocol;
pub mod reasoning;
pub mod rules;
