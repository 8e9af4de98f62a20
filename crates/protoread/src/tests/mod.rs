
mod property_limits;
