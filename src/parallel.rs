//! Parallel batch model construction and evaluation using Rayon
//!
//! Enable with the `parallel` feature:
//! ```toml
//! fitmodel = { version = "0.2", features = ["parallel"] }
//! ```

use crate::{FactoryError, Function, FunctionFactory};
use rayon::prelude::*;

impl FunctionFactory {
    /// Build one function per model string, in parallel
    ///
    /// Results come back in input order; a failing string does not affect
    /// the others.
    ///
    /// # Example
    /// ```
    /// use fitmodel::FunctionFactory;
    ///
    /// let factory = FunctionFactory::new();
    /// let results = factory.create_initialized_batch(&["name=FlatBackground,A0=2", "name=Nope"]);
    /// assert_eq!(results[0].as_ref().unwrap().get_parameter("A0").unwrap(), 2.0);
    /// assert!(results[1].is_err());
    /// ```
    pub fn create_initialized_batch(
        &self,
        inputs: &[&str],
    ) -> Vec<Result<Box<dyn Function>, FactoryError>> {
        inputs
            .par_iter()
            .map(|input| self.create_initialized(input))
            .collect()
    }
}

/// Evaluate `function` at every point of `xs`, in parallel
pub fn function_1d_parallel(function: &dyn Function, xs: &[f64]) -> Vec<f64> {
    xs.par_iter().map(|&x| function.function_1d(x)).collect()
}
