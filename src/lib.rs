pub mod aggregate;
pub mod boundary;
pub mod config;
pub mod convert;
pub mod error;
pub mod ignore;
pub mod model;
pub mod modules;
pub mod parsers;
pub mod report;
pub mod resolve;
