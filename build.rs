fn main() {
    // ESP-IDF link/env metadata is only needed for the device build.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
