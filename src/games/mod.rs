pub mod arithmetic;
pub mod words;

pub use arithmetic::{ArithmeticChallenge, ArithmeticSource, Operator};
pub use words::{ScrambleChallenge, SourceError, WordList, WordScrambleSource};
