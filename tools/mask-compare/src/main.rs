// Comparison CLI for the box-filter mask blurs vs the Gaussian reference.
//
// Usage:
//   mask-compare compare <shape> <size> <radius> [--quality low|high] [--path separable|sat] [--tolerance N]
//   mask-compare render <shape> <size> <radius> [--quality low|high] [--path separable|sat] [--reference] -o <output.pgm>
//   mask-compare list

use mask_blur::{
    blur_ground_truth, blur_with_path, BlurPath, BlurQuality, BlurStyle, BlurredMask, Mask,
};
use mask_compare::{available_shapes, compare_masks, make_shape, save_pgm};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "render" => cmd_render(&args[2..]),
        "compare" => cmd_compare(&args[2..]),
        "list" => cmd_list(),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("mask-compare — Compare fast mask blurs against the Gaussian reference");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  compare <shape> <size> <radius> [--quality low|high] [--path separable|sat] [--tolerance N]");
    eprintln!("      Blur a test shape both ways and compare pixel-by-pixel.");
    eprintln!();
    eprintln!("  render <shape> <size> <radius> [options] [--reference] -o <output.pgm>");
    eprintln!("      Blur a test shape and save it as a PGM image.");
    eprintln!();
    eprintln!("  list");
    eprintln!("      List available shape names.");
}

fn cmd_list() {
    println!("Available shapes:");
    for name in available_shapes() {
        println!("  {}", name);
    }
}

/// Options shared by `compare` and `render`.
struct Request {
    src: Mask,
    shape: String,
    radius: f32,
    quality: BlurQuality,
    path: BlurPath,
    tolerance: u8,
    reference: bool,
    output: Option<String>,
}

fn fail(msg: &str) -> ! {
    eprintln!("{}", msg);
    process::exit(1);
}

fn parse_request(args: &[String], usage: &str) -> Request {
    if args.len() < 3 {
        fail(usage);
    }

    let shape = args[0].clone();
    let size: u32 = args[1].parse().unwrap_or_else(|_| fail("Invalid size"));
    let radius: f32 = args[2].parse().unwrap_or_else(|_| fail("Invalid radius"));
    let src = make_shape(&shape, size).unwrap_or_else(|| {
        fail(&format!(
            "Unknown shape: '{}'. Use 'list' to see available shapes.",
            shape
        ))
    });

    let mut req = Request {
        src,
        shape,
        radius,
        quality: BlurQuality::High,
        path: BlurPath::Separable,
        tolerance: 3,
        reference: false,
        output: None,
    };

    let mut i = 3;
    while i < args.len() {
        let value = args.get(i + 1).map(String::as_str);
        match (args[i].as_str(), value) {
            ("--quality", Some("low")) => req.quality = BlurQuality::Low,
            ("--quality", Some("high")) => req.quality = BlurQuality::High,
            ("--path", Some("separable")) => req.path = BlurPath::Separable,
            ("--path", Some("sat")) => req.path = BlurPath::SummedArea,
            ("--tolerance", Some(v)) => {
                req.tolerance = v.parse().unwrap_or_else(|_| fail("Invalid tolerance"));
            }
            ("-o", Some(v)) => req.output = Some(v.to_string()),
            ("--reference", _) => {
                req.reference = true;
                i += 1;
                continue;
            }
            _ => fail(&format!("Unknown option: {}", args[i])),
        }
        i += 2;
    }
    req
}

fn run_fast(req: &Request) -> BlurredMask {
    blur_with_path(&req.src, req.radius, BlurStyle::Normal, req.quality, req.path)
        .unwrap_or_else(|e| fail(&format!("Blur failed: {}", e)))
}

fn run_reference(req: &Request) -> BlurredMask {
    blur_ground_truth(&req.src, req.radius, BlurStyle::Normal)
        .unwrap_or_else(|e| fail(&format!("Reference blur failed: {}", e)))
}

fn cmd_compare(args: &[String]) {
    let req = parse_request(
        args,
        "Usage: mask-compare compare <shape> <size> <radius> [--quality low|high] [--path separable|sat] [--tolerance N]",
    );

    println!(
        "Comparing '{}' {}x{} at radius {} ({:?}, {:?}) against the reference...",
        req.shape,
        req.src.width(),
        req.src.height(),
        req.radius,
        req.quality,
        req.path
    );
    let fast = run_fast(&req);
    let slow = run_reference(&req);
    println!(
        "  margins: fast={:?} reference={:?}",
        (fast.margin.x, fast.margin.y),
        (slow.margin.x, slow.margin.y)
    );

    let result = compare_masks(&fast.mask, &slow.mask);
    println!("{}", result);

    if !result.identical {
        println!("\nDifference histogram:");
        for (diff_val, &count) in result.diff_histogram.iter().enumerate().skip(1) {
            if count > 0 {
                println!("  diff={}: {} pixels", diff_val, count);
            }
        }
    }

    if result.max_diff > req.tolerance {
        eprintln!(
            "\nFAILED: max_diff {} exceeds tolerance {}",
            result.max_diff, req.tolerance
        );
        process::exit(1);
    }
    println!("\nWITHIN TOLERANCE ({})", req.tolerance);
}

fn cmd_render(args: &[String]) {
    let req = parse_request(
        args,
        "Usage: mask-compare render <shape> <size> <radius> [options] [--reference] -o <output.pgm>",
    );

    let out = if req.reference {
        run_reference(&req)
    } else {
        run_fast(&req)
    };
    let output = req.output.clone().unwrap_or_else(|| {
        format!(
            "{}_{}_r{}.pgm",
            req.shape,
            req.src.width(),
            req.radius
        )
    });

    save_pgm(Path::new(&output), &out.mask)
        .unwrap_or_else(|e| fail(&format!("Failed to save image: {}", e)));
    println!(
        "Saved: {} ({}x{})",
        output,
        out.mask.width(),
        out.mask.height()
    );
}
