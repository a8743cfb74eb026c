//! Test support for code built on ironrow.
//!
//! - **Fixtures**: generate title datasets of any size, well-formed or with
//!   deliberate defects at known line numbers.
//! - **Assertions**: compare parse output against an expected record set,
//!   with or without regard to order.
//! - **Mock I/O**: line sources for the streaming path that never end or
//!   fail partway, for cancellation and error tests.
//!
//! ```
//! use ironrow::testing::*;
//! use ironrow::{Parser, ParserConfig, Title};
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = TsvBuilder::new().rows(0..100).build();
//! let parser: Parser<Title> = Parser::new(ParserConfig::default().with_workers(4))?;
//! let titles = parser.parse(&input)?;
//! assert_titles_in_order(&titles, 0..100);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
