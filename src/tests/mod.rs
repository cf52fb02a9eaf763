//! Whole-pipeline tests: known formulas and property checks.

mod fixtures;
