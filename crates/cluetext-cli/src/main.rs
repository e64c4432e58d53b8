//! cluetext CLI - Parse, validate, and preview cluetext markup
//!
//! Usage:
//!   ctcli [OPTIONS] [COMMAND] <FILE>
//!
//! Commands:
//!   parse     Parse and display the block tree (default)
//!   validate  Check markup for problems
//!   stats     Show tree statistics
//!   reveal    Play the typewriter reveal, or show one frame with --budget

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;
use std::thread;
use std::time::Duration;

use cluetext_core::metrics::nesting_depth;
use cluetext_core::{
    reveal, total_text_length, Block, Page, ParseResult, Parser, Typewriter, TypewriterConfig,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();

    match run(&args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let config = parse_args(args)?;
    init_tracing(config.verbose);

    let input = read_input(&config.file)?;
    tracing::debug!(
        file = %config.file,
        command = ?config.command,
        bytes = input.len(),
        "read input"
    );

    let mut parser = Parser::new();
    if let Some(depth) = config.max_depth {
        parser = parser.with_max_depth(depth);
    }

    match config.command {
        Command::Parse => cmd_parse(&parser, &input, &config),
        Command::Validate => cmd_validate(&parser, &input, &config),
        Command::Stats => cmd_stats(&parser, &input),
        Command::Reveal => cmd_reveal(&parser, &input, &config),
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(file: &str) -> Result<String, String> {
    if file == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| format!("failed to read stdin: {}", e))?;
        return Ok(input);
    }
    fs::read_to_string(file).map_err(|e| format!("failed to read '{}': {}", file, e))
}

#[derive(Debug)]
struct Config {
    command: Command,
    file: String,
    format: OutputFormat,
    verbose: bool,
    max_depth: Option<usize>,
    budget: Option<usize>,
    typewriter: TypewriterConfig,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Parse,
    Validate,
    Stats,
    Reveal,
}

#[derive(Debug, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_args(args: &[String]) -> Result<Config, String> {
    let mut command = Command::Parse;
    let mut format = OutputFormat::Text;
    let mut verbose = false;
    let mut max_depth = None;
    let mut budget = None;
    let mut typewriter = TypewriterConfig::default();
    let mut file = None;

    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                process::exit(0);
            }
            "-V" | "--version" => {
                println!("ctcli {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "-v" | "--verbose" => verbose = true,
            "-j" | "--json" => format = OutputFormat::Json,
            "--instant" => typewriter = typewriter.with_instant(true),
            "--max-depth" => max_depth = Some(flag_value(args, &mut i)?),
            "--budget" => budget = Some(flag_value(args, &mut i)?),
            "--delay" => {
                let ms: u64 = flag_value(args, &mut i)?;
                typewriter = typewriter.with_delay(Duration::from_millis(ms));
            }
            "--step" => typewriter = typewriter.with_chars_per_tick(flag_value(args, &mut i)?),
            "parse" => command = Command::Parse,
            "validate" => command = Command::Validate,
            "stats" => command = Command::Stats,
            "reveal" => command = Command::Reveal,
            "-" => file = set_file(file, arg)?,
            _ if arg.starts_with('-') => {
                return Err(format!("unknown option: {}", arg));
            }
            _ => file = set_file(file, arg)?,
        }
        i += 1;
    }

    let file = file.ok_or_else(|| "no input file specified".to_string())?;

    Ok(Config {
        command,
        file,
        format,
        verbose,
        max_depth,
        budget,
        typewriter,
    })
}

fn set_file(current: Option<String>, arg: &str) -> Result<Option<String>, String> {
    if current.is_some() {
        return Err("multiple files specified".to_string());
    }
    Ok(Some(arg.to_string()))
}

/// Numeric value following the flag at `args[*i]`; advances `i` past it.
fn flag_value<T: std::str::FromStr>(args: &[String], i: &mut usize) -> Result<T, String> {
    let flag = &args[*i];
    *i += 1;
    let value = args
        .get(*i)
        .ok_or_else(|| format!("{} needs a value", flag))?;
    value
        .parse()
        .map_err(|_| format!("invalid value for {}: {}", flag, value))
}

fn print_help() {
    eprintln!(
        r#"ctcli - cluetext markup parser and previewer

USAGE:
    ctcli [OPTIONS] [COMMAND] <FILE>

COMMANDS:
    parse       Parse and display the block tree (default)
    validate    Check markup for problems without output
    stats       Show tree statistics
    reveal      Play the typewriter reveal in the terminal

OPTIONS:
    -v, --verbose        Show the nested tree and debug logs
    -j, --json           Output in JSON format
        --max-depth N    Deepest handwritten nesting to parse (default 3, max 64)
        --budget N       (reveal) Print the frame after N characters
        --delay MS       (reveal) Milliseconds between characters (default 30)
        --step N         (reveal) Characters per tick (default 1)
        --instant        (reveal) Show the complete text at once
    -h, --help           Print help information
    -V, --version        Print version information

Use - as FILE to read from stdin. RUST_LOG overrides the log level.

EXAMPLES:
    ctcli riddle.txt                  Parse a riddle
    ctcli -j riddle.txt               Output blocks as JSON
    ctcli validate riddle.txt         Report unclosed tags
    ctcli reveal --delay 50 riddle.txt
    ctcli reveal --budget 20 -j riddle.txt
"#
    );
}

fn warn_errors(result: &ParseResult) {
    for error in result.errors.iter() {
        eprintln!("warning: {}", error);
    }
}

// =============================================================================
// Parse Command
// =============================================================================

fn cmd_parse(parser: &Parser, input: &str, config: &Config) -> Result<(), String> {
    let result = parser.parse_with_recovery(input);
    warn_errors(&result);

    match config.format {
        OutputFormat::Json => print_json(&convert_pages(&result.pages))?,
        OutputFormat::Text => {
            for (index, page) in result.pages.iter().enumerate() {
                if result.pages.len() > 1 {
                    println!("Page {}", index + 1);
                }
                if config.verbose {
                    print_blocks_verbose(&page.blocks, 0);
                } else {
                    print_blocks_summary(&page.blocks);
                }
            }
        }
    }

    Ok(())
}

// =============================================================================
// Validate Command
// =============================================================================

fn cmd_validate(parser: &Parser, input: &str, config: &Config) -> Result<(), String> {
    let result = parser.parse_with_recovery(input);

    if result.errors.is_empty() {
        if matches!(config.format, OutputFormat::Json) {
            println!(r#"{{"valid": true, "errors": []}}"#);
        } else {
            println!("Valid: no problems found");
        }
        return Ok(());
    }

    if matches!(config.format, OutputFormat::Json) {
        let errors: Vec<_> = result
            .errors
            .iter()
            .map(|e| {
                serde_json::json!({
                    "kind": e.kind.as_str(),
                    "message": e.message,
                    "span": e.span.map(|s| serde_json::json!({"start": s.start, "end": s.end})),
                    "recoverable": e.recoverable
                })
            })
            .collect();
        println!("{}", serde_json::json!({"valid": false, "errors": errors}));
    } else {
        eprintln!("Invalid: {} problem(s) found", result.errors.len());
        for error in result.errors.iter() {
            eprintln!("  - {}", error);
        }
    }
    Err(format!("{} problem(s) found", result.errors.len()))
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(parser: &Parser, input: &str) -> Result<(), String> {
    let result = parser.parse_with_recovery(input);
    let stats = TreeStats::from_pages(&result.pages, input);

    println!("Markup Statistics");
    println!("-----------------");
    println!("Pages:          {}", result.pages.len());
    println!("Text length:    {}", stats.text_length);
    println!("Max nesting:    {}", stats.max_depth);
    println!();
    println!("Blocks:");
    println!("  Total:          {}", stats.total_blocks);
    println!("  Text:           {}", stats.text);
    println!("  Bold:           {}", stats.bold);
    println!("  Italic:         {}", stats.italic);
    println!("  Colored:        {}", stats.colored);
    println!("  Handwritten:    {}", stats.handwritten);
    println!("  Images:         {}", stats.images);
    println!("  Breaks:         {}", stats.breaks);
    println!();
    println!("Source:");
    println!("  Characters:     {}", stats.chars);
    println!("  Lines:          {}", stats.lines);
    println!();
    println!("Problems:       {}", result.errors.len());

    Ok(())
}

#[derive(Default)]
struct TreeStats {
    total_blocks: usize,
    text: usize,
    bold: usize,
    italic: usize,
    colored: usize,
    handwritten: usize,
    images: usize,
    breaks: usize,
    text_length: usize,
    max_depth: usize,
    chars: usize,
    lines: usize,
}

impl TreeStats {
    fn from_pages(pages: &[Page], input: &str) -> Self {
        let mut stats = Self {
            chars: input.chars().count(),
            lines: input.lines().count(),
            ..Self::default()
        };

        for page in pages {
            stats.text_length += total_text_length(&page.blocks);
            stats.max_depth = stats.max_depth.max(nesting_depth(&page.blocks));
            stats.count_blocks(&page.blocks);
        }
        stats
    }

    fn count_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.total_blocks += 1;
            match block {
                Block::Text(_) => self.text += 1,
                Block::Bold(_) => self.bold += 1,
                Block::Italic(_) => self.italic += 1,
                Block::Colored { .. } => self.colored += 1,
                Block::Handwritten { children, .. } => {
                    self.handwritten += 1;
                    self.count_blocks(children);
                }
                Block::Image(_) => self.images += 1,
                Block::LineBreak | Block::ParagraphBreak => self.breaks += 1,
            }
        }
    }
}

// =============================================================================
// Reveal Command
// =============================================================================

fn cmd_reveal(parser: &Parser, input: &str, config: &Config) -> Result<(), String> {
    let result = parser.parse_with_recovery(input);
    warn_errors(&result);
    let blocks: Vec<Block> = result
        .pages
        .into_iter()
        .flat_map(|page| page.blocks)
        .collect();

    if let Some(budget) = config.budget {
        let frame = reveal(&blocks, budget);
        return match config.format {
            OutputFormat::Json => print_json(&JsonReveal {
                budget,
                consumed: frame.consumed,
                total: total_text_length(&blocks),
                blocks: frame.blocks.iter().map(convert_block).collect(),
            }),
            OutputFormat::Text => {
                println!("{}", render_plain(&frame.blocks));
                Ok(())
            }
        };
    }

    let mut typewriter = Typewriter::new(&blocks, config.typewriter);
    let mut stdout = io::stdout();
    let mut written = 0;

    let frame = typewriter.current();
    write_frame(&mut stdout, &mut written, &render_plain(&frame.blocks))?;
    while !typewriter.is_complete() {
        thread::sleep(typewriter.delay());
        let frame = typewriter.tick();
        write_frame(&mut stdout, &mut written, &render_plain(&frame.blocks))?;
    }
    writeln!(stdout).map_err(|e| e.to_string())?;
    Ok(())
}

/// Print the part of `frame` past the first `written` bytes.
///
/// Reveal frames only grow, so each rendered frame extends the last one.
fn write_frame(out: &mut impl Write, written: &mut usize, frame: &str) -> Result<(), String> {
    let new = frame.get(*written..).unwrap_or_default();
    write!(out, "{}", new).map_err(|e| e.to_string())?;
    out.flush().map_err(|e| e.to_string())?;
    *written = frame.len();
    Ok(())
}

/// Flatten blocks to terminal text: emphasis markers are dropped, images
/// become `[image: PATH]`.
fn render_plain(blocks: &[Block]) -> String {
    let mut out = String::new();
    push_plain(blocks, &mut out);
    out
}

fn push_plain(blocks: &[Block], out: &mut String) {
    for block in blocks {
        match block {
            Block::Handwritten { children, .. } => push_plain(children, out),
            Block::Image(path) => {
                out.push_str("[image: ");
                out.push_str(path);
                out.push(']');
            }
            Block::LineBreak => out.push('\n'),
            Block::ParagraphBreak => out.push_str("\n\n"),
            other => out.push_str(other.text().unwrap_or_default()),
        }
    }
}

// =============================================================================
// JSON Output
// =============================================================================

#[derive(Serialize)]
struct JsonPage<'a> {
    blocks: Vec<JsonBlock<'a>>,
}

#[derive(Serialize)]
struct JsonReveal<'a> {
    budget: usize,
    consumed: usize,
    total: usize,
    blocks: Vec<JsonBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonBlock<'a> {
    Text {
        content: &'a str,
    },
    Bold {
        content: &'a str,
    },
    Italic {
        content: &'a str,
    },
    Colored {
        content: &'a str,
        color: &'a str,
    },
    Handwritten {
        style: &'static str,
        children: Vec<JsonBlock<'a>>,
    },
    Image {
        src: &'a str,
    },
    LineBreak,
    ParagraphBreak,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn convert_pages<'a>(pages: &'a [Page]) -> Vec<JsonPage<'a>> {
    pages
        .iter()
        .map(|page| JsonPage {
            blocks: page.blocks.iter().map(convert_block).collect(),
        })
        .collect()
}

fn convert_block<'a>(block: &'a Block) -> JsonBlock<'a> {
    match block {
        Block::Text(content) => JsonBlock::Text { content },
        Block::Bold(content) => JsonBlock::Bold { content },
        Block::Italic(content) => JsonBlock::Italic { content },
        Block::Colored { content, color } => JsonBlock::Colored { content, color },
        Block::Handwritten { style, children } => JsonBlock::Handwritten {
            style: style.as_str(),
            children: children.iter().map(convert_block).collect(),
        },
        Block::Image(src) => JsonBlock::Image { src },
        Block::LineBreak => JsonBlock::LineBreak,
        Block::ParagraphBreak => JsonBlock::ParagraphBreak,
    }
}

// =============================================================================
// Text Output
// =============================================================================

fn print_blocks_summary(blocks: &[Block]) {
    for block in blocks {
        println!("{}", describe_block(block));
    }
}

fn print_blocks_verbose(blocks: &[Block], indent: usize) {
    let pad = "  ".repeat(indent);
    for block in blocks {
        println!("{}{}", pad, describe_block(block));
        if let Block::Handwritten { children, .. } = block {
            print_blocks_verbose(children, indent + 1);
        }
    }
}

fn describe_block(block: &Block) -> String {
    match block {
        Block::Text(s) | Block::Bold(s) | Block::Italic(s) => {
            format!("{}: {:?}", block.kind(), s)
        }
        Block::Colored { content, color } => format!("colored({}): {:?}", color, content),
        Block::Handwritten { style, children } => format!(
            "handwritten({}): {} block(s), {} chars",
            style.as_str(),
            children.len(),
            total_text_length(children)
        ),
        Block::Image(src) => format!("image: {}", src),
        Block::LineBreak | Block::ParagraphBreak => block.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("ctcli")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_reveal_flags() {
        let config = parse_args(&args(&["reveal", "--delay", "5", "--step", "2", "clue.txt"]))
            .unwrap();
        assert!(matches!(config.command, Command::Reveal));
        assert_eq!(config.typewriter.delay, Duration::from_millis(5));
        assert_eq!(config.typewriter.chars_per_tick, 2);
        assert_eq!(config.file, "clue.txt");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_args(&args(&["--budget", "lots", "a.txt"])).is_err());
        assert!(parse_args(&args(&["--budget"])).is_err());
        assert!(parse_args(&args(&["a.txt", "b.txt"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
    }

    #[test]
    fn stdin_dash_is_a_file() {
        let config = parse_args(&args(&["stats", "-"])).unwrap();
        assert_eq!(config.file, "-");
    }

    #[test]
    fn plain_rendering() {
        let blocks = Parser::new().parse_blocks(
            "Go **north**\n{{image:/map.png}}\n\n{{handwritten}}then *left*{{/handwritten}}",
            0,
        );
        assert_eq!(
            render_plain(&blocks),
            "Go north\n[image: /map.png]\n\nthen left"
        );
    }

    #[test]
    fn frames_write_only_new_text() {
        let mut out = Vec::new();
        let mut written = 0;
        write_frame(&mut out, &mut written, "ab").unwrap();
        write_frame(&mut out, &mut written, "abc").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "abc");
        assert_eq!(written, 3);
    }

    #[test]
    fn rendered_frames_extend_each_other() {
        let blocks = Parser::new().parse_blocks(
            "Go **north**\n{{handwritten}}then *left*{{/handwritten}}\n{{image:/x.png}} done",
            0,
        );
        let mut previous = String::new();
        for frame in Typewriter::new(&blocks, TypewriterConfig::default()) {
            let rendered = render_plain(&frame.blocks);
            assert!(
                rendered.starts_with(&previous),
                "{:?} does not extend {:?}",
                rendered,
                previous
            );
            previous = rendered;
        }
        assert_eq!(previous, render_plain(&blocks));
    }

    #[test]
    fn json_blocks_are_tagged() {
        let blocks = Parser::new().parse_blocks("{{color:red}}x{{/color}}\n", 0);
        let json: Vec<_> = blocks.iter().map(convert_block).collect();
        let value = serde_json::to_value(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"type": "colored", "content": "x", "color": "red"},
                {"type": "line_break"}
            ])
        );
    }
}
