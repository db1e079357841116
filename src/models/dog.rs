// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Dog profile model (kept per user session).

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DogSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: String,
    pub name: String,
    pub breed: String,
    pub age: String,
    pub size: DogSize,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub personality: Vec<String>,
    pub vaccinated: bool,
    #[serde(rename = "spayedNeutered")]
    pub spayed_neutered: bool,
    #[serde(default)]
    pub description: String,
}

/// A dog as submitted by the add-dog form (no id yet).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewDog {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub breed: String,
    #[serde(default)]
    pub age: String,
    pub size: DogSize,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub personality: Vec<String>,
    #[serde(default)]
    pub vaccinated: bool,
    #[serde(default, rename = "spayedNeutered")]
    pub spayed_neutered: bool,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
}

/// Partial edit of an existing dog.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DogUpdate {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub size: Option<DogSize>,
    pub photo: Option<String>,
    pub personality: Option<Vec<String>>,
    pub vaccinated: Option<bool>,
    #[serde(rename = "spayedNeutered")]
    pub spayed_neutered: Option<bool>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}
