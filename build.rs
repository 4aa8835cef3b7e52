fn main() {
    println!("cargo:rerun-if-env-changed=ROOMLINK_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=ROOMLINK_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=ROOMLINK_REMOTE_HOST");
    println!("cargo:rerun-if-env-changed=ROOMLINK_REMOTE_AUTH");

    // ESP-IDF link arguments are only needed for the device build.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
