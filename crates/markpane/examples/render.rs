use markpane::PreviewConfig;
use markpane::RenderHandle;
use markpane::RenderState;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    env_logger::init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut config_path: Option<String> = None;
    let mut base_url: Option<String> = None;
    let mut standalone = false;
    let mut typing = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config_path = Some(parse_string(&args, &mut i, "--config")?);
            }
            "--base-url" => {
                base_url = Some(parse_string(&args, &mut i, "--base-url")?);
            }
            "--standalone" => {
                standalone = true;
                i += 1;
            }
            "--simulate-typing" => {
                typing = true;
                i += 1;
            }
            _ => break,
        }
    }

    let mut config = match &config_path {
        Some(path) => PreviewConfig::load(path).map_err(invalid_input)?,
        None => PreviewConfig::default(),
    };

    let input = if i < args.len() {
        let path = &args[i];
        let input = fs::read_to_string(path)?;
        if base_url.is_none()
            && let Some(parent) = Path::new(path).parent()
        {
            let abs = fs::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf());
            base_url = Some(format!("file://{}/", abs.display()));
        }
        input
    } else {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        s
    };
    if base_url.is_some() {
        config.render.base_url = base_url;
    }

    let handle = markpane::start(&config);
    let state = if typing {
        type_out(&handle, &input).await
    } else {
        let seq = handle.render(input);
        wait_for_commit(&handle, seq).await
    };

    if standalone {
        let css = markpane::initialize(&config).stylesheet().unwrap_or_default();
        println!(
            "<!doctype html>\n<html><head><meta charset=\"utf-8\"><style>\n{css}</style></head>\n<body>\n{}</body></html>",
            state.display_html()
        );
    } else {
        print!("{}", state.display_html());
    }

    handle.shutdown();
    Ok(())
}

/// Feeds the document one line at a time, faster than the debounce window, like a typist would.
async fn type_out(handle: &RenderHandle, input: &str) -> RenderState {
    let mut seq = 0;
    let mut end = 0;
    for line in input.split_inclusive('\n') {
        end += line.len();
        seq = handle.render(&input[..end]);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    if seq == 0 {
        seq = handle.render(input);
    }
    wait_for_commit(handle, seq).await
}

async fn wait_for_commit(handle: &RenderHandle, seq: u64) -> RenderState {
    let mut updates = handle.subscribe();
    match updates
        .wait_for(|s| !s.is_rendering && s.revision == seq)
        .await
    {
        Ok(state) => state.clone(),
        Err(_) => handle.state(),
    }
}

fn print_help() {
    eprintln!(
        "Usage: render [options] [path]\n\
\n\
Options:\n\
  --config <path>             Load preview settings from a TOML file\n\
  --base-url <url>            Resolve relative links/images against this base\n\
  --standalone                Wrap the output in an HTML page with the highlight stylesheet\n\
  --simulate-typing           Feed the input line by line through the debounced scheduler\n\
  -h, --help                  Show this help\n\
\n\
If [path] is omitted, reads Markdown from stdin. Set RUST_LOG=debug to trace render cycles."
    );
}

fn parse_string(args: &[String], i: &mut usize, flag: &str) -> io::Result<String> {
    let Some(v) = args.get(*i + 1) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{flag} expects a value"),
        ));
    };
    *i += 2;
    Ok(v.to_string())
}

fn invalid_input(err: markpane::ConfigError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
}
