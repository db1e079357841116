// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user dog list (in memory only).

use crate::models::{Dog, DogUpdate, NewDog};

#[derive(Debug, Clone, Default)]
pub struct DogRegistry {
    dogs: Vec<Dog>,
    next_id: u64,
}

impl DogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dog and assign its id.
    pub fn add(&mut self, new: NewDog) -> Dog {
        self.next_id += 1;
        let dog = Dog {
            id: self.next_id.to_string(),
            name: new.name,
            breed: new.breed,
            age: new.age,
            size: new.size,
            photo: new.photo,
            personality: new.personality,
            vaccinated: new.vaccinated,
            spayed_neutered: new.spayed_neutered,
            description: new.description,
        };
        self.dogs.push(dog.clone());
        dog
    }

    /// Apply the fields present in `update`.
    pub fn update(&mut self, id: &str, update: DogUpdate) -> Option<Dog> {
        let dog = self.dogs.iter_mut().find(|d| d.id == id)?;

        if let Some(name) = update.name {
            dog.name = name;
        }
        if let Some(breed) = update.breed {
            dog.breed = breed;
        }
        if let Some(age) = update.age {
            dog.age = age;
        }
        if let Some(size) = update.size {
            dog.size = size;
        }
        if let Some(photo) = update.photo {
            dog.photo = photo;
        }
        if let Some(personality) = update.personality {
            dog.personality = personality;
        }
        if let Some(vaccinated) = update.vaccinated {
            dog.vaccinated = vaccinated;
        }
        if let Some(spayed_neutered) = update.spayed_neutered {
            dog.spayed_neutered = spayed_neutered;
        }
        if let Some(description) = update.description {
            dog.description = description;
        }

        Some(dog.clone())
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.dogs.len();
        self.dogs.retain(|d| d.id != id);
        self.dogs.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Dog> {
        self.dogs.iter().find(|d| d.id == id)
    }

    pub fn list(&self) -> &[Dog] {
        &self.dogs
    }
}
