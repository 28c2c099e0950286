mod composite_tests;
mod constraint_tests;
