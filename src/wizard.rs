//! Step logic of the registration wizard.
//!
//! Individual flow: `ChooseType → SelectPackage → EnterDetails → Confirm →
//! Submitted`. Bulk registrations pick packages per student, so they go from
//! `ChooseType` straight to `EnterDetails`. Moves are one step forward or
//! back; `Submitted` only leaves through [`Wizard::restart`].

use crate::pricing::{AddOn, AddOns, Package, compute_total_price};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    ChooseType,
    SelectPackage,
    EnterDetails,
    Confirm,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationKind {
    Individual,
    Bulk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(WizardStep),
    /// Details need a logged-in user; come back to `return_to` afterwards.
    LoginRequired { return_to: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("choose a registration type first")]
    NoKindChosen,
    #[error("select a package first")]
    NoPackageChosen,
    #[error("that action is not available on this step")]
    WrongStep,
    #[error("already on the first step")]
    AtStart,
    #[error("registration already submitted")]
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    step: WizardStep,
    kind: Option<RegistrationKind>,
    package: Option<Package>,
    add_ons: AddOns,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::ChooseType,
            kind: None,
            package: None,
            add_ons: AddOns::NONE,
        }
    }

    /// Re-enters an individual registration after a login redirect with the
    /// package that was chosen before it.
    pub fn resume(package: Package) -> Self {
        Self {
            step: WizardStep::SelectPackage,
            kind: Some(RegistrationKind::Individual),
            package: Some(package),
            add_ons: AddOns::NONE,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn package(&self) -> Option<Package> {
        self.package
    }

    pub fn add_ons(&self) -> AddOns {
        self.add_ons
    }

    pub fn total_price(&self) -> Option<u32> {
        self.package.map(|p| compute_total_price(p, self.add_ons))
    }

    pub fn choose_kind(&mut self, kind: RegistrationKind) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ChooseType)?;
        self.kind = Some(kind);
        Ok(())
    }

    /// Picks a package; add-ons the package already includes or does not
    /// sell are dropped from the selection.
    pub fn select_package(&mut self, package: Package, add_ons: AddOns) -> Result<(), WizardError> {
        self.expect_step(WizardStep::SelectPackage)?;
        let sells = |addon: AddOn| package.purchasable_add_ons().contains(&addon);
        self.package = Some(package);
        self.add_ons = AddOns::new(
            add_ons.guinness && sells(AddOn::Guinness),
            add_ons.greek_night && sells(AddOn::GreekNight),
        );
        Ok(())
    }

    pub fn next(&mut self, authenticated: bool) -> Result<Advance, WizardError> {
        let next = match self.step {
            WizardStep::ChooseType => match self.kind {
                None => return Err(WizardError::NoKindChosen),
                Some(RegistrationKind::Individual) => WizardStep::SelectPackage,
                Some(RegistrationKind::Bulk) => WizardStep::EnterDetails,
            },
            WizardStep::SelectPackage => {
                let package = self.package.ok_or(WizardError::NoPackageChosen)?;
                if !authenticated {
                    return Ok(Advance::LoginRequired {
                        return_to: format!("/register?package={package}"),
                    });
                }
                WizardStep::EnterDetails
            }
            WizardStep::EnterDetails => WizardStep::Confirm,
            WizardStep::Confirm => WizardStep::Submitted,
            WizardStep::Submitted => return Err(WizardError::Submitted),
        };
        self.step = next;
        Ok(Advance::Moved(next))
    }

    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let prev = match self.step {
            WizardStep::ChooseType => return Err(WizardError::AtStart),
            WizardStep::SelectPackage => WizardStep::ChooseType,
            WizardStep::EnterDetails => match self.kind {
                Some(RegistrationKind::Bulk) => WizardStep::ChooseType,
                _ => WizardStep::SelectPackage,
            },
            WizardStep::Confirm => WizardStep::EnterDetails,
            WizardStep::Submitted => return Err(WizardError::Submitted),
        };
        self.step = prev;
        Ok(prev)
    }

    pub fn restart(&mut self) {
        *self = Self::new();
    }

    fn expect_step(&self, step: WizardStep) -> Result<(), WizardError> {
        match self.step {
            WizardStep::Submitted => Err(WizardError::Submitted),
            current if current == step => Ok(()),
            _ => Err(WizardError::WrongStep),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn individual_flow_walks_every_step() {
        let mut wizard = Wizard::new();
        wizard.choose_kind(RegistrationKind::Individual).unwrap();
        assert_eq!(wizard.next(true), Ok(Advance::Moved(WizardStep::SelectPackage)));
        wizard
            .select_package(Package::ExplorerPass, AddOns::new(true, false))
            .unwrap();
        assert_eq!(wizard.total_price(), Some(130));
        assert_eq!(wizard.next(true), Ok(Advance::Moved(WizardStep::EnterDetails)));
        assert_eq!(wizard.next(true), Ok(Advance::Moved(WizardStep::Confirm)));
        assert_eq!(wizard.next(true), Ok(Advance::Moved(WizardStep::Submitted)));
        assert_eq!(wizard.next(true), Err(WizardError::Submitted));
        assert_eq!(wizard.back(), Err(WizardError::Submitted));
    }

    #[test]
    fn details_require_login_and_keep_the_package() {
        let mut wizard = Wizard::new();
        wizard.choose_kind(RegistrationKind::Individual).unwrap();
        wizard.next(false).unwrap();
        wizard.select_package(Package::FullPass, AddOns::NONE).unwrap();

        let advance = wizard.next(false).unwrap();
        assert_eq!(
            advance,
            Advance::LoginRequired {
                return_to: "/register?package=full-pass".to_string()
            }
        );
        assert_eq!(wizard.step(), WizardStep::SelectPackage);

        let mut resumed = Wizard::resume(Package::FullPass);
        assert_eq!(resumed.next(true), Ok(Advance::Moved(WizardStep::EnterDetails)));
        assert_eq!(resumed.package(), Some(Package::FullPass));
    }

    #[test]
    fn cannot_skip_package_selection() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.next(true), Err(WizardError::NoKindChosen));
        wizard.choose_kind(RegistrationKind::Individual).unwrap();
        wizard.next(true).unwrap();
        assert_eq!(wizard.next(true), Err(WizardError::NoPackageChosen));
    }

    #[test]
    fn inherent_addons_are_not_selectable() {
        let mut wizard = Wizard::resume(Package::GuinnessOnly);
        wizard
            .select_package(Package::GuinnessOnly, AddOns::new(true, true))
            .unwrap();
        assert_eq!(wizard.add_ons(), AddOns::new(false, true));
        assert_eq!(wizard.total_price(), Some(70));

        wizard.select_package(Package::FullPass, AddOns::new(true, true)).unwrap();
        assert_eq!(wizard.add_ons(), AddOns::NONE);
        assert_eq!(wizard.total_price(), Some(260));
    }

    #[test]
    fn back_returns_one_step_and_restart_resets() {
        let mut wizard = Wizard::new();
        wizard.choose_kind(RegistrationKind::Bulk).unwrap();
        assert_eq!(wizard.next(false), Ok(Advance::Moved(WizardStep::EnterDetails)));
        assert_eq!(wizard.back(), Ok(WizardStep::ChooseType));
        assert_eq!(wizard.back(), Err(WizardError::AtStart));

        wizard.next(false).unwrap();
        wizard.next(false).unwrap();
        wizard.next(false).unwrap();
        assert_eq!(wizard.step(), WizardStep::Submitted);
        wizard.restart();
        assert_eq!(wizard, Wizard::new());
    }
}
