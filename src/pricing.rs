//! Package catalog and add-on pricing.
//!
//! Prices are whole euros. [`compute_total_price`] is shared by the
//! individual, bulk and admin registration paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const GUINNESS_PRICE: u32 = 30;
pub const GREEK_NIGHT_PRICE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum Package {
    GuinnessOnly,
    GreekNightOnly,
    StarterPass,
    ExplorerPass,
    EnthusiastPass,
    FullPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddOn {
    Guinness,
    GreekNight,
}

impl AddOn {
    pub const fn price(self) -> u32 {
        match self {
            AddOn::Guinness => GUINNESS_PRICE,
            AddOn::GreekNight => GREEK_NIGHT_PRICE,
        }
    }
}

/// The add-ons a registrant ticked in the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOns {
    pub guinness: bool,
    pub greek_night: bool,
}

impl AddOns {
    pub const NONE: AddOns = AddOns {
        guinness: false,
        greek_night: false,
    };

    pub const fn new(guinness: bool, greek_night: bool) -> Self {
        Self {
            guinness,
            greek_night,
        }
    }

    const fn selected(self, addon: AddOn) -> bool {
        match addon {
            AddOn::Guinness => self.guinness,
            AddOn::GreekNight => self.greek_night,
        }
    }
}

impl Package {
    pub const ALL: [Package; 6] = [
        Package::GuinnessOnly,
        Package::GreekNightOnly,
        Package::StarterPass,
        Package::ExplorerPass,
        Package::EnthusiastPass,
        Package::FullPass,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Package::GuinnessOnly => "guinness-only",
            Package::GreekNightOnly => "greek-night-only",
            Package::StarterPass => "starter-pass",
            Package::ExplorerPass => "explorer-pass",
            Package::EnthusiastPass => "enthusiast-pass",
            Package::FullPass => "full-pass",
        }
    }

    pub const fn base_price(self) -> u32 {
        match self {
            Package::GuinnessOnly => 30,
            Package::GreekNightOnly => 40,
            Package::StarterPass => 70,
            Package::ExplorerPass => 100,
            Package::EnthusiastPass => 160,
            Package::FullPass => 260,
        }
    }

    /// Add-ons that come with the package and cannot be bought again.
    pub fn inherent_add_ons(self) -> &'static [AddOn] {
        match self {
            Package::FullPass => &[AddOn::Guinness, AddOn::GreekNight],
            Package::GuinnessOnly => &[AddOn::Guinness],
            Package::GreekNightOnly => &[AddOn::GreekNight],
            Package::StarterPass | Package::ExplorerPass | Package::EnthusiastPass => &[],
        }
    }

    /// Add-ons the UI may offer for purchase on top of the package.
    pub fn purchasable_add_ons(self) -> &'static [AddOn] {
        match self {
            Package::FullPass => &[],
            Package::GuinnessOnly => &[AddOn::GreekNight],
            Package::GreekNightOnly => &[AddOn::Guinness],
            Package::StarterPass | Package::ExplorerPass | Package::EnthusiastPass => {
                &[AddOn::Guinness, AddOn::GreekNight]
            }
        }
    }

    pub fn includes(self, addon: AddOn) -> bool {
        self.inherent_add_ons().contains(&addon)
    }

    /// Flags as persisted on a participant: inherent add-ons are always set,
    /// purchasable ones follow the selection.
    pub fn effective_add_ons(self, selected: AddOns) -> AddOns {
        AddOns {
            guinness: self.includes(AddOn::Guinness) || selected.guinness,
            greek_night: self.includes(AddOn::GreekNight) || selected.greek_night,
        }
    }

    /// Inverse of [`Package::effective_add_ons`]: what was bought on top of
    /// the package, given the stored flags.
    pub fn purchased_add_ons(self, stored: AddOns) -> AddOns {
        AddOns {
            guinness: stored.guinness && !self.includes(AddOn::Guinness),
            greek_night: stored.greek_night && !self.includes(AddOn::GreekNight),
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown package: {0}")]
pub struct UnknownPackage(pub String);

impl FromStr for Package {
    type Err = UnknownPackage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Package::ALL
            .into_iter()
            .find(|p| p.id() == s.trim())
            .ok_or_else(|| UnknownPackage(s.to_string()))
    }
}

pub fn compute_total_price(package: Package, selected: AddOns) -> u32 {
    package
        .purchasable_add_ons()
        .iter()
        .filter(|addon| selected.selected(**addon))
        .fold(package.base_price(), |total, addon| total + addon.price())
}

/// Catalog entry served to the registration UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub id: Package,
    pub base_price: u32,
    pub included_add_ons: Vec<AddOn>,
    pub purchasable_add_ons: Vec<AddOnPrice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddOnPrice {
    pub id: AddOn,
    pub price: u32,
}

pub fn catalog() -> Vec<PackageInfo> {
    Package::ALL
        .into_iter()
        .map(|p| PackageInfo {
            id: p,
            base_price: p.base_price(),
            included_add_ons: p.inherent_add_ons().to_vec(),
            purchasable_add_ons: p
                .purchasable_add_ons()
                .iter()
                .map(|a| AddOnPrice {
                    id: *a,
                    price: a.price(),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_passes_charge_each_addon_independently() {
        for (package, base) in [
            (Package::StarterPass, 70),
            (Package::ExplorerPass, 100),
            (Package::EnthusiastPass, 160),
        ] {
            assert_eq!(compute_total_price(package, AddOns::NONE), base);
            assert_eq!(compute_total_price(package, AddOns::new(true, false)), base + 30);
            assert_eq!(compute_total_price(package, AddOns::new(false, true)), base + 40);
            assert_eq!(compute_total_price(package, AddOns::new(true, true)), base + 70);
        }
        assert_eq!(
            compute_total_price(Package::StarterPass, AddOns::new(true, true)),
            140
        );
    }

    #[test]
    fn full_pass_never_double_charges() {
        assert_eq!(compute_total_price(Package::FullPass, AddOns::new(true, true)), 260);
        assert_eq!(compute_total_price(Package::FullPass, AddOns::NONE), 260);
        assert!(Package::FullPass.purchasable_add_ons().is_empty());
    }

    #[test]
    fn single_event_packages_only_sell_the_other_addon() {
        assert_eq!(compute_total_price(Package::GuinnessOnly, AddOns::new(true, false)), 30);
        assert_eq!(compute_total_price(Package::GuinnessOnly, AddOns::new(true, true)), 70);
        assert_eq!(compute_total_price(Package::GreekNightOnly, AddOns::new(false, true)), 40);
        assert_eq!(compute_total_price(Package::GreekNightOnly, AddOns::new(true, true)), 70);
    }

    #[test]
    fn effective_addons_include_inherent_ones() {
        assert_eq!(
            Package::FullPass.effective_add_ons(AddOns::NONE),
            AddOns::new(true, true)
        );
        assert_eq!(
            Package::GuinnessOnly.effective_add_ons(AddOns::NONE),
            AddOns::new(true, false)
        );
        assert_eq!(
            Package::ExplorerPass.effective_add_ons(AddOns::new(false, true)),
            AddOns::new(false, true)
        );
    }

    #[test]
    fn purchased_addons_drop_what_the_package_brought() {
        assert_eq!(
            Package::FullPass.purchased_add_ons(AddOns::new(true, true)),
            AddOns::NONE
        );
        assert_eq!(
            Package::GuinnessOnly.purchased_add_ons(AddOns::new(true, true)),
            AddOns::new(false, true)
        );
        assert_eq!(
            Package::StarterPass.purchased_add_ons(AddOns::new(true, false)),
            AddOns::new(true, false)
        );
    }

    #[test]
    fn package_ids_round_trip_through_serde_and_from_str() {
        for package in Package::ALL {
            let json = serde_json::to_string(&package).unwrap();
            assert_eq!(json, format!("\"{}\"", package.id()));
            assert_eq!(package.id().parse::<Package>().unwrap(), package);
        }
        assert!("vip-pass".parse::<Package>().is_err());
    }

    #[test]
    fn catalog_lists_every_package() {
        let catalog = catalog();
        assert_eq!(catalog.len(), Package::ALL.len());
        let full = catalog.iter().find(|p| p.id == Package::FullPass).unwrap();
        assert_eq!(full.included_add_ons.len(), 2);
    }
}
