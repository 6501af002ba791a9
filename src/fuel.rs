//! Fuel cost estimation from fixed mileage and price tables

use serde::{Deserialize, Serialize};

use crate::{PlannerError, Result};

/// Average mileage in km/l for known vehicle models
const VEHICLE_MILEAGE: [(&str, f64); 5] = [
    ("Honda City", 16.0),
    ("Maruti Swift", 18.0),
    ("Hyundai Creta", 15.0),
    ("Toyota Fortuner", 10.0),
    ("Royal Enfield Classic", 35.0),
];

/// Price in INR per litre
const FUEL_PRICES: [(&str, f64); 3] = [("Petrol", 110.0), ("Diesel", 100.0), ("CNG", 80.0)];

pub const DEFAULT_MILEAGE_KMPL: f64 = 15.0;
pub const DEFAULT_FUEL_PRICE: f64 = 110.0;
pub const DEFAULT_FUEL_TYPE: &str = "Petrol";

/// Real-world driving reaches this share of the rated mileage
const PRACTICAL_FACTOR: f64 = 0.85;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FuelEstimate {
    pub vehicle: String,
    pub fuel_type: String,
    pub distance_km: f64,
    /// km/l, one decimal
    pub practical_mileage: f64,
    pub price_per_liter: f64,
    /// Whole rupees
    pub estimated_cost: f64,
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
    let key = key.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| *value)
}

/// Rated mileage for a vehicle, falling back to the default
#[must_use]
pub fn base_mileage(vehicle: &str) -> f64 {
    lookup(&VEHICLE_MILEAGE, vehicle).unwrap_or(DEFAULT_MILEAGE_KMPL)
}

#[must_use]
pub fn fuel_price(fuel_type: &str) -> f64 {
    lookup(&FUEL_PRICES, fuel_type).unwrap_or(DEFAULT_FUEL_PRICE)
}

pub fn estimate(vehicle: &str, fuel_type: Option<&str>, distance_km: f64) -> Result<FuelEstimate> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(PlannerError::validation(format!(
            "Distance must be a non-negative number, got {distance_km}"
        )));
    }

    let fuel_type = fuel_type
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FUEL_TYPE);
    let practical_mileage = (base_mileage(vehicle) * PRACTICAL_FACTOR * 10.0).round() / 10.0;
    let price_per_liter = fuel_price(fuel_type);
    let estimated_cost = (distance_km / practical_mileage * price_per_liter).round();

    Ok(FuelEstimate {
        vehicle: vehicle.trim().to_string(),
        fuel_type: fuel_type.to_string(),
        distance_km,
        practical_mileage,
        price_per_liter,
        estimated_cost,
    })
}
