use std::f64::consts::{PI, TAU};

pub const OUTPUT_FILE: &str = "languages-overview.svg";

const WIDTH: u32 = 800;
const HEIGHT: u32 = 280;

const BG_COLOR: &str = "#0b0f1a";
const TEXT_COLOR: &str = "#e5e7eb";
const OTHER_COLOR: &str = "#6b7280";

// Left / repo pie (warm, vibrant)
const REPO_COLORS: &[&str] = &["#f97316", "#eab308", "#22c55e", "#fb7185", "#a78bfa"];

// Right / activity pie (high-contrast)
const ACTIVITY_COLORS: &[&str] = &["#06b6d4", "#6366f1", "#00c2a8", "#ff6b6b", "#ffd166"];

const OUTER_RADIUS: f64 = 88.0;
const INNER_RADIUS: f64 = 56.0;
const LEGEND_ROW_HEIGHT: i32 = 20;

/// One donut wedge: ring-segment path data plus its legend fields.
pub struct Slice {
    pub path: String,
    pub color: &'static str,
    pub label: String,
    /// Rounded independently per slice; rows may not sum to 100.
    pub percent: u32,
    /// Angular span in radians.
    pub span: f64,
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn point(cx: f64, cy: f64, r: f64, angle: f64) -> (f64, f64) {
    (cx + r * angle.cos(), cy + r * angle.sin())
}

/// Lay out one donut chart: consecutive clockwise slices from twelve o'clock,
/// each an outer arc, a line inward, an inner arc back, and closure.
pub fn pie_slices(data: &[(String, u64)], cx: f64, cy: f64, colors: &'static [&'static str]) -> Vec<Slice> {
    let total: u64 = data.iter().map(|(_, value)| value).sum();
    // A zero total would divide by zero; treat it as 1 so slices degenerate
    // to zero-span arcs instead.
    let total = if total == 0 { 1 } else { total } as f64;

    let mut angle = -PI / 2.0;
    let mut slices = Vec::with_capacity(data.len());

    for (i, (label, value)) in data.iter().enumerate() {
        let frac = *value as f64 / total;
        let span = frac * TAU;
        let (a1, a2) = (angle, angle + span);
        let large_arc = if span > PI { 1 } else { 0 };
        let color = if label == "Other" {
            OTHER_COLOR
        } else {
            colors[i % colors.len()]
        };

        let (x1, y1) = point(cx, cy, OUTER_RADIUS, a1);
        let (x2, y2) = point(cx, cy, OUTER_RADIUS, a2);
        let (x3, y3) = point(cx, cy, INNER_RADIUS, a2);
        let (x4, y4) = point(cx, cy, INNER_RADIUS, a1);

        let path = format!(
            "M{x1:.2},{y1:.2} A{OUTER_RADIUS},{OUTER_RADIUS} 0 {large_arc} 1 {x2:.2},{y2:.2} \
             L{x3:.2},{y3:.2} A{INNER_RADIUS},{INNER_RADIUS} 0 {large_arc} 0 {x4:.2},{y4:.2} Z"
        );

        slices.push(Slice {
            path,
            color,
            label: label.clone(),
            percent: (frac * 100.0).round() as u32,
            span,
        });
        angle = a2;
    }

    slices
}

/// One legend row per slice: color swatch, label, rounded percentage.
fn legend(x: i32, y: i32, slices: &[Slice]) -> String {
    let mut out = String::new();
    for (i, slice) in slices.iter().enumerate() {
        let row_y = y + (i as i32) * LEGEND_ROW_HEIGHT;
        out.push_str(&format!(
            "<rect x=\"{x}\" y=\"{}\" width=\"12\" height=\"12\" fill=\"{}\" rx=\"2\"/>\n",
            row_y - 12,
            slice.color
        ));
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"{TEXT_COLOR}\">{} — {}%</text>\n",
            x + 18,
            row_y - 2,
            escape_xml(&slice.label),
            slice.percent
        ));
    }
    out
}

fn arcs(slices: &[Slice]) -> String {
    slices
        .iter()
        .map(|slice| format!("<path d=\"{}\" fill=\"{}\"/>", slice.path, slice.color))
        .collect()
}

/// Render the combined document: two titled donut charts, each with a legend.
pub fn render(repo_top: &[(String, u64)], activity_top: &[(String, u64)]) -> String {
    let repo_slices = pie_slices(repo_top, 280.0, 160.0, REPO_COLORS);
    let activity_slices = pie_slices(activity_top, 680.0, 160.0, ACTIVITY_COLORS);

    format!(
        r#"<svg width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" xmlns="http://www.w3.org/2000/svg">
<rect width="100%" height="100%" fill="{BG_COLOR}"/>
<text x="40" y="36" font-size="16" fill="{TEXT_COLOR}">Languages by repositories</text>
<text x="440" y="36" font-size="16" fill="{TEXT_COLOR}">Languages by activity</text>

<!-- left legend -->
{left_legend}
<!-- right legend -->
{right_legend}
<!-- left pie -->
{left_arcs}
<!-- right pie -->
{right_arcs}
</svg>
"#,
        left_legend = legend(40, 70, &repo_slices),
        right_legend = legend(440, 70, &activity_slices),
        left_arcs = arcs(&repo_slices),
        right_arcs = arcs(&activity_slices),
    )
}
