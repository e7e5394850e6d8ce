//! Parameter file loading

use std::fs::read_to_string;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::common::PlannerResult;

/// Load a TOML parameter file into `P`
pub fn load<P, T>(path: T) -> PlannerResult<P>
where
    P: DeserializeOwned,
    T: AsRef<Path>,
{
    let params_str = read_to_string(path)?;
    from_str(&params_str)
}

/// Parse TOML parameters from a string
pub fn from_str<P>(params_str: &str) -> PlannerResult<P>
where
    P: DeserializeOwned,
{
    Ok(toml::from_str(params_str)?)
}
