// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::Profile;
use std::str::FromStr;

#[test]
fn default_profile_is_base() {
    assert_eq!(Profile::default(), Profile::Base);
    assert_eq!(Profile::default().tag(), "base_profile");
}

#[test]
fn tags_round_trip_through_from_str() {
    for profile in [Profile::Base, Profile::Adaptive, Profile::Custom] {
        assert_eq!(Profile::from_str(profile.tag()), Ok(profile));
        assert_eq!(profile.to_string(), profile.tag());
    }
}

#[test]
fn unknown_profile_name_is_rejected() {
    assert!(Profile::from_str("unrestricted").is_err());
}
