/// Convert a temperature in Kelvin to degrees Fahrenheit.
pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    (kelvin - 273.15) * (9.0 / 5.0) + 32.0
}
