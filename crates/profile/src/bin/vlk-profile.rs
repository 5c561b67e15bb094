//! Profile every registered operation on this host and persist the
//! winners.
//!
//! ```text
//! vlk-profile [--path FILE] [--quick] [--dry-run]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use vlk_profile::{BenchRunner, HostId, ProfileEngine, prefs};

struct Options {
  path: PathBuf,
  quick: bool,
  dry_run: bool,
}

fn usage() -> &'static str {
  "usage: vlk-profile [--path FILE] [--quick] [--dry-run]\n\
   \n\
   --path FILE   profile file to update (default: $VLK_PROFILE_PATH,\n\
                 else ~/.vlk/vlk_profile.json)\n\
   --quick       shorter measurement windows (noisier)\n\
   --dry-run     measure and print, but do not write the profile"
}

fn parse_args() -> Result<Options, String> {
  let mut opts = Options {
    path: prefs::default_path(),
    quick: false,
    dry_run: false,
  };
  let mut args = std::env::args().skip(1);
  while let Some(arg) = args.next() {
    match arg.as_str() {
      "--path" => {
        let value = args.next().ok_or("--path requires a value")?;
        opts.path = PathBuf::from(value);
      }
      "--quick" => opts.quick = true,
      "--dry-run" => opts.dry_run = true,
      "--help" | "-h" => return Err(String::new()),
      other => return Err(format!("unknown argument `{other}`")),
    }
  }
  Ok(opts)
}

fn main() -> ExitCode {
  let opts = match parse_args() {
    Ok(opts) => opts,
    Err(msg) => {
      if msg.is_empty() {
        println!("{}", usage());
        return ExitCode::SUCCESS;
      }
      eprintln!("vlk-profile: {msg}\n\n{}", usage());
      return ExitCode::FAILURE;
    }
  };

  let caps = vlk_platform::detect();
  let host = HostId::of(&caps);
  println!("host {host}: {:?}, alignment {}", caps.exts(), caps.alignment());

  let registry = match vlk_kernels::build_registry() {
    Ok(reg) => reg,
    Err(err) => {
      eprintln!("vlk-profile: {err}");
      return ExitCode::FAILURE;
    }
  };

  let runner = if opts.quick { BenchRunner::quick() } else { BenchRunner::new() };
  let (chosen, reports) = match ProfileEngine::new(runner).run(&registry, &caps) {
    Ok(out) => out,
    Err(err) => {
      eprintln!("vlk-profile: {err}");
      return ExitCode::FAILURE;
    }
  };

  for report in &reports {
    println!("{}:", report.op);
    for result in &report.results {
      let marker = if result.impl_name == report.best { " *" } else { "" };
      println!(
        "  {:<12} {:>8} iters  {:>10.1} MiB/s{marker}",
        result.impl_name,
        result.iterations,
        result.throughput / (1024.0 * 1024.0),
      );
    }
  }

  if opts.dry_run {
    println!("dry run, not writing {}", opts.path.display());
    return ExitCode::SUCCESS;
  }

  match prefs::save(&opts.path, &host, &chosen) {
    Ok(()) => {
      println!("wrote {} ({} operations)", opts.path.display(), chosen.len());
      ExitCode::SUCCESS
    }
    Err(err) => {
      eprintln!("vlk-profile: {err}");
      ExitCode::FAILURE
    }
  }
}
