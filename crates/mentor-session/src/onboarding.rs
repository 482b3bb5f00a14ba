// onboarding.rs — The first-run wizard: Welcome, then Profile.
//
// Navigation is clamped at both ends. Finishing is only allowed from the last
// step and marks the profile's onboarding as complete.

use std::fmt;

use crate::error::OnboardingError;
use crate::profile::{ProfileService, ProfileUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnboardingStep {
    Welcome,
    Profile,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 2] = [OnboardingStep::Welcome, OnboardingStep::Profile];

    pub fn title(self) -> &'static str {
        match self {
            OnboardingStep::Welcome => "Welcome",
            OnboardingStep::Profile => "Profile",
        }
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

pub struct OnboardingFlow {
    profiles: ProfileService,
    index: usize,
}

impl OnboardingFlow {
    pub fn new(profiles: ProfileService) -> Self {
        Self { profiles, index: 0 }
    }

    pub fn current(&self) -> OnboardingStep {
        OnboardingStep::ALL[self.index]
    }

    /// 1-based position, for "Step 1 of 2" style headers.
    pub fn step_number(&self) -> usize {
        self.index + 1
    }

    pub fn step_count(&self) -> usize {
        OnboardingStep::ALL.len()
    }

    pub fn next(&mut self) -> OnboardingStep {
        self.index = (self.index + 1).min(OnboardingStep::ALL.len() - 1);
        self.current()
    }

    pub fn back(&mut self) -> OnboardingStep {
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == OnboardingStep::ALL.len()
    }

    /// Save what the profile step collects. Blank fields are left untouched.
    pub async fn save_profile_details(
        &self,
        username: Option<&str>,
        website: Option<&str>,
    ) -> Result<(), OnboardingError> {
        let mut update = ProfileUpdate::default();
        if let Some(username) = username.map(str::trim).filter(|s| !s.is_empty()) {
            update = update.username(username);
        }
        if let Some(website) = website.map(str::trim).filter(|s| !s.is_empty()) {
            update = update.website(website);
        }
        if update == ProfileUpdate::default() {
            return Ok(());
        }
        self.profiles
            .update_profile(update)
            .await
            .map_err(OnboardingError::ProfileDetails)
    }

    pub async fn upload_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, OnboardingError> {
        self.profiles
            .upload_avatar(file_name, bytes)
            .await
            .map_err(OnboardingError::AvatarUpload)
    }

    pub async fn finish(&self) -> Result<(), OnboardingError> {
        if !self.is_last() {
            return Err(OnboardingError::NotAtLastStep);
        }
        self.profiles
            .update_profile(ProfileUpdate::default().onboarding_complete(true))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "error completing onboarding");
                OnboardingError::Finish(e)
            })?;
        tracing::info!("onboarding complete");
        Ok(())
    }
}
