#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use flou_image as image;

#[doc(inline)]
pub use flou_imgproc as imgproc;

#[doc(inline)]
pub use flou_io as io;
