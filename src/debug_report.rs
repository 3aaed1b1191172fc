use nextdue::NextDateVerbose;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(out: &NextDateVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    let details = &out.details;
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Rule: \"{}\"", details.rule), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Input ━━━", ansi::GRAY));
    println!(
        "  {} {}",
        palette.dim("anchor:   "),
        palette.paint(details.anchor.format("%Y-%m-%d %a").to_string(), ansi::YELLOW)
    );
    println!(
        "  {} {}",
        palette.dim("reference:"),
        palette.paint(details.reference.format("%Y-%m-%d %a").to_string(), ansi::YELLOW)
    );

    println!("\n{}", palette.paint("━━━ Search ━━━", ansi::GRAY));
    let trace = &details.trace;
    let mode = match trace.horizon_days {
        Some(horizon) => format!("scan, horizon {horizon} days"),
        None => "step from anchor".to_string(),
    };
    println!("  {} {}", palette.dim("mode:           "), palette.paint(mode, ansi::BLUE));
    println!(
        "  {} {}",
        palette.dim("first candidate:"),
        palette.paint(trace.first_candidate.format("%Y-%m-%d").to_string(), ansi::BLUE)
    );
    println!("  {} {}", palette.dim("steps:          "), palette.paint(trace.steps.to_string(), ansi::BLUE));

    println!("\n{}", palette.paint("━━━ Result ━━━", ansi::GRAY));
    println!("  {}", palette.bold(palette.paint(&out.date, ansi::GREEN)));

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Search: {}", palette.paint(format!("{:?}", trace.elapsed), ansi::GREEN));
    println!("\n{}", palette.dim("  Tip: Set NEXTDUE_DEBUG_SEARCH=1 to trace every search"));
    println!();
}
