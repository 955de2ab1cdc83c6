// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Switches for each kind of meta table. A disabled kind ignores every manipulation and never creates tables.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "PascalCase")
)]
pub struct MetaConfig {
    pub eqp: bool,
    pub gmp: bool,
    pub eqdp: bool,
    pub est: bool,
    pub cmp: bool,
    pub imc: bool,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            eqp: true,
            gmp: true,
            eqdp: true,
            est: true,
            cmp: true,
            imc: true,
        }
    }
}

impl MetaConfig {
    /// Only IMC files, for collections that never change character tables.
    pub fn imc_only() -> Self {
        Self {
            eqp: false,
            gmp: false,
            eqdp: false,
            est: false,
            cmp: false,
            imc: true,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_enabled() {
        let config: MetaConfig = serde_json::from_str(r#"{"Imc": false}"#).unwrap();
        assert!(config.eqp);
        assert!(!config.imc);

        let json = serde_json::to_string(&MetaConfig::imc_only()).unwrap();
        assert_eq!(
            serde_json::from_str::<MetaConfig>(&json).unwrap(),
            MetaConfig::imc_only()
        );
    }
}
