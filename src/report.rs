//! Cobertura XML output.
//!
//! Layout written by [`write_xml`]:
//!   <coverage line-rate=".." ... timestamp="..">
//!     <sources><source>/module/root</source></sources>
//!     <packages>
//!       <package name=".." line-rate="..">
//!         <classes>
//!           <class name=".." filename="..">
//!             <methods>
//!               <method name=".." signature="">
//!                 <lines><line number=".." hits=".."/></lines>
//!               </method>
//!             </methods>
//!             <lines>...</lines>
//!           </class>
//!         </classes>
//!       </package>
//!     </packages>
//!   </coverage>
//!
//! Wrapper elements with nothing in them are left out.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;
use crate::model::{Class, Coverage, Line, Method, Package};

pub const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const DOCTYPE: &str =
    r#"<!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd">"#;

/// Rates are reported with single precision, in the shortest form that
/// round-trips. Values below 1e-4 switch to exponent notation with at least
/// two exponent digits, e.g. `1e-05`.
fn fmt_rate(rate: f64) -> String {
    let rate = rate as f32;
    if rate == 0.0 || rate.abs() >= 1e-4 {
        return rate.to_string();
    }
    let sci = format!("{rate:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => sci,
    }
}

/// Serialize `coverage` as a Cobertura document.
pub fn write_xml<W: Write + ?Sized>(out: &mut W, coverage: &Coverage) -> Result<()> {
    writeln!(out, "{XML_HEADER}")?;
    writeln!(out, "{DOCTYPE}")?;

    let mut writer = Writer::new_with_indent(&mut *out, b' ', 2);

    let line_rate = fmt_rate(coverage.line_rate);
    let lines_covered = coverage.lines_covered.to_string();
    let lines_valid = coverage.lines_valid.to_string();
    let timestamp = coverage.timestamp.to_string();
    let root = BytesStart::new("coverage").with_attributes([
        ("line-rate", line_rate.as_str()),
        ("branch-rate", "0"),
        ("lines-covered", lines_covered.as_str()),
        ("lines-valid", lines_valid.as_str()),
        ("branches-covered", "0"),
        ("branches-valid", "0"),
        ("complexity", "0"),
        ("version", ""),
        ("timestamp", timestamp.as_str()),
    ]);

    if coverage.sources.is_empty() && coverage.packages.is_empty() {
        writer.write_event(Event::Empty(root))?;
    } else {
        writer.write_event(Event::Start(root))?;

        if !coverage.sources.is_empty() {
            open(&mut writer, "sources")?;
            for source in &coverage.sources {
                open(&mut writer, "source")?;
                writer.write_event(Event::Text(BytesText::new(source)))?;
                close(&mut writer, "source")?;
            }
            close(&mut writer, "sources")?;
        }

        if !coverage.packages.is_empty() {
            open(&mut writer, "packages")?;
            for package in &coverage.packages {
                write_package(&mut writer, package)?;
            }
            close(&mut writer, "packages")?;
        }

        close(&mut writer, "coverage")?;
    }

    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn open<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_package<W: Write>(writer: &mut Writer<W>, package: &Package) -> Result<()> {
    let line_rate = fmt_rate(package.line_rate);
    let start = BytesStart::new("package").with_attributes([
        ("name", package.name.as_str()),
        ("line-rate", line_rate.as_str()),
        ("branch-rate", "0"),
        ("complexity", "0"),
    ]);

    if package.classes.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    open(writer, "classes")?;
    for class in &package.classes {
        write_class(writer, class)?;
    }
    close(writer, "classes")?;
    close(writer, "package")
}

fn write_class<W: Write>(writer: &mut Writer<W>, class: &Class) -> Result<()> {
    let line_rate = fmt_rate(class.line_rate);
    let start = BytesStart::new("class").with_attributes([
        ("name", class.name.as_str()),
        ("filename", class.filename.as_str()),
        ("line-rate", line_rate.as_str()),
        ("branch-rate", "0"),
        ("complexity", "0"),
    ]);

    if class.methods.is_empty() && class.lines.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    if !class.methods.is_empty() {
        open(writer, "methods")?;
        for method in &class.methods {
            write_method(writer, method)?;
        }
        close(writer, "methods")?;
    }
    write_lines(writer, &class.lines)?;
    close(writer, "class")
}

fn write_method<W: Write>(writer: &mut Writer<W>, method: &Method) -> Result<()> {
    let line_rate = fmt_rate(method.line_rate);
    let start = BytesStart::new("method").with_attributes([
        ("name", method.name.as_str()),
        ("signature", ""),
        ("line-rate", line_rate.as_str()),
        ("branch-rate", "0"),
        ("complexity", "0"),
    ]);

    if method.lines.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    write_lines(writer, &method.lines)?;
    close(writer, "method")
}

fn write_lines<W: Write>(writer: &mut Writer<W>, lines: &[Line]) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    open(writer, "lines")?;
    for line in lines {
        let number = line.number.to_string();
        let hits = line.hits.to_string();
        let elem = BytesStart::new("line")
            .with_attributes([("number", number.as_str()), ("hits", hits.as_str())]);
        writer.write_event(Event::Empty(elem))?;
    }
    close(writer, "lines")
}
