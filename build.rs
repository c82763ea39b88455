fn main() {
    // The ESP-IDF build environment is only needed for Xtensa firmware builds;
    // host builds (tests, simulated device) skip it.
    if let Ok(target) = std::env::var("TARGET") {
        if target.contains("xtensa") {
            embuild::espidf::sysenv::output();
        }
    }
}
