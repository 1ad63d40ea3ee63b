pub mod builder;
pub mod ir;
pub mod names;
pub mod printer;
pub mod stream;
pub mod translator;
