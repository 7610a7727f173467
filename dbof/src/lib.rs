#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]
#![doc = include_str!("../README.md")]
//! > _Note_: This documentation is auto-generated
//! > from the project's README.md file.
extern crate alloc;

pub mod codec;
pub mod stream;
pub mod types;
