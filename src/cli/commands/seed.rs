use clap::{Arg, Command};

pub const CMD_SEED_ADMIN: &str = "seed-admin";
pub const ARG_ADMIN_EMAIL: &str = "email";
pub const ARG_ADMIN_PASSWORD: &str = "password";

#[must_use]
pub fn subcommand() -> Command {
    Command::new(CMD_SEED_ADMIN)
        .about("Create or promote the first administrator (refused in production)")
        .arg(
            Arg::new(ARG_ADMIN_EMAIL)
                .long(ARG_ADMIN_EMAIL)
                .help("Administrator email")
                .env("STORE_ADMIN_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD)
                .long(ARG_ADMIN_PASSWORD)
                .help("Administrator password")
                .env("STORE_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}
