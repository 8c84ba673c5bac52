pub mod net;
pub mod room;
pub mod stroke;
pub mod words;
