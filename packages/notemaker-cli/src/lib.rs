use std::path::PathBuf;

use clap::{
	Args,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};

pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

/// Flags shared by every notemaker binary.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
	/// Path to the TOML configuration file.
	#[arg(long, short = 'c', value_name = "FILE", env = "NOTEMAKER_CONFIG")]
	pub config: PathBuf,
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
}
