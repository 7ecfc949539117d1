//! RAR header parsing modules.
//!
//! The three parsers share no common trait: a volume's signature selects
//! [`rar4`] or [`rar5`] once, and [`legacy`] is only tried after [`rar4`].

pub mod block_header;
pub mod file_header;
pub mod legacy;
pub mod rar4;
pub mod rar5;
pub mod unicode_name;

pub use block_header::BlockHeader;
pub use file_header::NameLengthLayout;
