//! Rendering conveniences beyond the DIB surface: console output and SVG.

use crate::symbol::Symbol;

/*---- Utilities ----*/

/// Returns a string of SVG code for an image depicting the given symbol,
/// with the given number of border modules. The string always uses Unix
/// newlines (\n), regardless of the platform.
pub fn to_svg_string(symbol: &Symbol, border: i32) -> String {
    assert!(border >= 0, "Border must be non-negative");
    let matrix = symbol.module_matrix();
    let size = matrix.len() as i32;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result +=
        "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    let dimension = size.checked_add(border.checked_mul(2).unwrap()).unwrap();
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension
    );
    result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
    result += "\t<path d=\"";
    let mut first = true;
    for (y, row) in matrix.iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            if cell > 0 {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x as i32 + border, y as i32 + border);
            }
        }
    }
    result += "\" fill=\"#000000\"/>\n";
    result += "</svg>\n";
    result
}

/// Prints the given symbol to the console as block characters, with the
/// standard four-module quiet zone.
pub fn print_symbol(symbol: &Symbol) {
    let border: i32 = 4;
    let matrix = symbol.module_matrix();
    let size = matrix.len() as i32;
    let dark_at = |x: i32, y: i32| {
        (0..size).contains(&x) && (0..size).contains(&y) && matrix[y as usize][x as usize] > 0
    };
    for y in -border..size + border {
        for x in -border..size + border {
            let c: char = if dark_at(x, y) { '█' } else { ' ' };
            print!("{0}{0}", c);
        }
        println!();
    }
    println!();
}
