//! Homesite Admin CLI
//!
//! Manage the pages and images of a homesite snapshot from the command line.
//!
//! ## Usage
//!
//! ```bash
//! homesite-admin init
//! homesite-admin add-page HomePage Home home --body "<p>Welcome</p>"
//! homesite-admin upload-image cover.png --title "Cover"
//! homesite-admin add-page WebPage About about --parent /home \
//!     --subtitle "Our Story" --block "text:<p>Hello</p>"
//! homesite-admin publish /home/about
//! homesite-admin show /home/about
//! homesite-admin show /home/about --preview
//! homesite-admin tree
//! ```

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{CommandContext, NewPage};
use homesite_conf::{Settings, init_logging};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "homesite-admin")]
#[command(about = "Homesite content administration utility", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Settings file (defaults to homesite.toml when present)
	#[arg(long, global = true, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Snapshot file, overriding the configured data_file
	#[arg(long, global = true, value_name = "PATH")]
	data_file: Option<PathBuf>,

	/// Verbosity level (can be repeated)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Create an empty site snapshot
	Init {
		/// Overwrite an existing snapshot
		#[arg(long)]
		force: bool,
	},

	/// Print the page tree
	Tree,

	/// Create a page
	AddPage {
		/// Page type: HomePage or WebPage
		#[arg(value_name = "TYPE")]
		page_type: String,

		/// Page title
		#[arg(value_name = "TITLE")]
		title: String,

		/// URL slug
		#[arg(value_name = "SLUG")]
		slug: String,

		/// Path of the parent page (root when omitted)
		#[arg(long, value_name = "PATH")]
		parent: Option<String>,

		/// Subtitle of a web page
		#[arg(long)]
		subtitle: Option<String>,

		/// Cover image id of a web page
		#[arg(long, value_name = "IMAGE_ID")]
		cover_image: Option<String>,

		/// Rich-text body of a home page
		#[arg(long)]
		body: Option<String>,

		/// Web page body block as KIND:VALUE (repeatable, kept in order)
		#[arg(long = "block", value_name = "KIND:VALUE")]
		blocks: Vec<String>,

		/// Show the page in menus
		#[arg(long)]
		show_in_menus: bool,
	},

	/// Upload an image file
	UploadImage {
		/// Image file
		#[arg(value_name = "FILE")]
		file: PathBuf,

		/// Image title (defaults to the file name)
		#[arg(long)]
		title: Option<String>,
	},

	/// Delete an image; cover images using it are unset
	DeleteImage {
		/// Image id
		#[arg(value_name = "IMAGE_ID")]
		id: String,
	},

	/// Publish a page
	Publish {
		/// Page path, e.g. /home/about
		#[arg(value_name = "PATH")]
		path: String,
	},

	/// Take a live page offline
	Unpublish {
		/// Page path
		#[arg(value_name = "PATH")]
		path: String,
	},

	/// Print the template context of a page
	Show {
		/// Page path
		#[arg(value_name = "PATH")]
		path: String,

		/// Print the rendered body instead
		#[arg(long)]
		body: bool,

		/// Show the latest saved edits, published or not
		#[arg(long)]
		preview: bool,
	},

	/// Validate every stored page
	Check,
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();

	if let Err(e) = run(cli).await {
		eprintln!("{} {:#}", "Error:".red().bold(), e);
		process::exit(1);
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
	match cli.verbosity {
		0 => {}
		1 => settings.logging.level = "debug".to_string(),
		_ => settings.logging.level = "trace".to_string(),
	}
	init_logging(&settings.logging)?;

	let ctx = CommandContext::from_settings(&settings, cli.data_file);
	tracing::debug!(site = %settings.site_name, data_file = %ctx.data_file.display(), "running command");

	match cli.command {
		Commands::Init { force } => {
			commands::init(&ctx, force)?;
			println!(
				"{} {}",
				"Created".green().bold(),
				ctx.data_file.display()
			);
		}
		Commands::Tree => {
			let site = ctx.load_site()?;
			let lines = commands::tree(&site).await?;
			if lines.is_empty() {
				println!("{}", "No pages.".dimmed());
			}
			for line in lines {
				println!("{line}");
			}
		}
		Commands::AddPage {
			page_type,
			title,
			slug,
			parent,
			subtitle,
			cover_image,
			body,
			blocks,
			show_in_menus,
		} => {
			let new_page = NewPage {
				page_type,
				parent,
				title,
				slug,
				subtitle,
				cover_image,
				body,
				blocks,
				show_in_menus,
			};
			let mut site = ctx.load_site()?;
			let node = commands::add_page(&mut site, &new_page).await?;
			ctx.save_site(&site)?;
			println!("{} {} ({})", "Created".green().bold(), node.path, node.id);
		}
		Commands::UploadImage { file, title } => {
			let mut site = ctx.load_site()?;
			let image = commands::upload_image(&mut site, &ctx, &file, title.as_deref()).await?;
			ctx.save_site(&site)?;
			println!(
				"{} {} ({})",
				"Uploaded".green().bold(),
				image.title,
				image.id
			);
		}
		Commands::DeleteImage { id } => {
			let mut site = ctx.load_site()?;
			let (image, referencing) = commands::delete_image(&mut site, &ctx, &id).await?;
			ctx.save_site(&site)?;
			println!("{} {}", "Deleted".yellow().bold(), image.title);
			if !referencing.is_empty() {
				println!(
					"{}",
					format!("{} page(s) referenced this image", referencing.len()).dimmed()
				);
			}
		}
		Commands::Publish { path } => {
			let mut site = ctx.load_site()?;
			let state = commands::set_published(&mut site, &path, true).await?;
			ctx.save_site(&site)?;
			println!("{} {}", path, state.to_string().green());
		}
		Commands::Unpublish { path } => {
			let mut site = ctx.load_site()?;
			let state = commands::set_published(&mut site, &path, false).await?;
			ctx.save_site(&site)?;
			println!("{} {}", path, state.to_string().yellow());
		}
		Commands::Show {
			path,
			body,
			preview,
		} => {
			let site = ctx.load_site()?;
			println!("{}", commands::show(&site, &path, body, preview).await?);
		}
		Commands::Check => {
			let site = ctx.load_site()?;
			let failures = commands::check(&site);
			if failures.is_empty() {
				println!("{}", "All pages are valid.".green());
			} else {
				for failure in &failures {
					println!("{} {failure}", "✗".red());
				}
				anyhow::bail!("{} invalid page(s)", failures.len());
			}
		}
	}
	Ok(())
}
