use std::path::PathBuf;

/// Node configuration and the broker CA certificate are baked into the
/// image at build time. Missing inputs produce empty files; the firmware
/// treats an empty file as a fatal configuration fault at boot.
const EMBEDDED_INPUTS: [(&str, &str); 2] = [
    ("HEARTLINK_CONFIG", "node_config.json"),
    ("HEARTLINK_CA_CERT", "ca_cert.pem"),
];

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap_or_else(|_| ".".into()));

    for (var, file_name) in EMBEDDED_INPUTS {
        println!("cargo:rerun-if-env-changed={var}");

        let contents = match std::env::var(var) {
            Ok(path) => {
                println!("cargo:rerun-if-changed={path}");
                match std::fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(e) => {
                        println!("cargo:warning={var}={path} unreadable: {e}");
                        String::new()
                    }
                }
            }
            Err(_) => String::new(),
        };

        if let Err(e) = std::fs::write(out_dir.join(file_name), contents) {
            println!("cargo:warning=failed to stage {file_name}: {e}");
        }
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
