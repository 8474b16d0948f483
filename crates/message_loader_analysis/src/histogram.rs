use std::fmt::Write as _;

/// One histogram bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub value: i64,
    pub count: usize,
    /// `#rrggbb`, green near the expected count, red far from it.
    pub colour: String,
}

/// Sample counts per value over a fixed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    buckets: Vec<Bucket>,
    expected_per_value: usize,
}

impl Histogram {
    /// Counts `samples` per value in `[min, max]`; samples outside the range are ignored.
    pub fn new(samples: &[i64], min: i64, max: i64, expected_per_value: usize) -> Self {
        let mut counts = vec![0usize; (max - min + 1).max(0) as usize];
        for &sample in samples {
            if (min..=max).contains(&sample) {
                counts[(sample - min) as usize] += 1;
            }
        }
        let buckets = counts
            .into_iter()
            .zip(min..)
            .map(|(count, value)| Bucket {
                value,
                count,
                colour: deviation_colour(count, expected_per_value),
            })
            .collect();
        Self {
            buckets,
            expected_per_value,
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn expected_per_value(&self) -> usize {
        self.expected_per_value
    }

    /// Horizontal bar chart, one 10px row per value.
    pub fn to_svg(&self) -> String {
        let rows = self.buckets.len();
        let height = rows * 10 + 30;
        let scale = 100.0 / rows.max(1) as f64;
        let mut svg = format!(
            r#"<svg version="1.1" width="500" height="{height}" viewBox="0 0 500 {height}"><g fill-opacity="0.8" transform="translate(25,10) scale(1,10)">"#
        );
        for (row, bucket) in self.buckets.iter().enumerate() {
            let _ = write!(
                svg,
                r#"<rect y="{row}" width="{}" height="1" fill="{}"><title>{}: {}</title></rect>"#,
                bucket.count as f64 * scale,
                bucket.colour,
                bucket.value,
                bucket.count
            );
        }
        svg.push_str(r##"</g><g fill="#00f" fill-opacity="0.5" transform="translate(25,17.5)">"##);
        let target = self.expected_per_value as f64 * scale;
        for row in 0..rows {
            let _ = write!(svg, r#"<rect y="{}" width="{target}" height="2.5"></rect>"#, row * 10);
        }
        svg.push_str("</g></svg>");
        svg
    }
}

fn deviation_colour(count: usize, expected: usize) -> String {
    let relative = if expected == 0 {
        if count == 0 { 0.0 } else { 1.0 }
    } else {
        ((count as f64 - expected as f64).abs() / expected as f64).clamp(0.0, 1.0)
    };
    let scaled = (255.0 * relative).round() as i64;
    let (r, g) = if relative > 0.5 {
        (255, 255 - ((scaled - 127) * 2).clamp(0, 255))
    } else {
        ((scaled * 2).clamp(0, 255), 255)
    };
    format!("#{r:02x}{g:02x}00")
}

/// Sample sequence drawn as a polyline of `index,value` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plot {
    points: String,
}

impl Plot {
    pub fn new(samples: &[i64]) -> Self {
        let points: Vec<String> = samples
            .iter()
            .enumerate()
            .map(|(index, value)| format!("{index},{value}"))
            .collect();
        Self {
            points: points.join(" "),
        }
    }

    pub fn points(&self) -> &str {
        &self.points
    }

    pub fn to_svg(&self) -> String {
        format!(
            r##"<svg version="1.1" width="545" height="215" viewBox="0 0 1090 430"><rect x="40" y="10" width="1000" height="400" fill="#fff"></rect><g stroke="#f00" stroke-width="0.25" fill="none" transform="translate(40,410) scale(0.1,-4)"><polyline vector-effect="non-scaling-stroke" points="{}"></polyline></g></svg>"##,
            self.points
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn colours_follow_the_deviation() {
        assert_eq!(deviation_colour(100, 100), "#00ff00");
        assert_eq!(deviation_colour(75, 100), "#80ff00");
        assert_eq!(deviation_colour(50, 100), "#ffff00");
        assert_eq!(deviation_colour(0, 100), "#ff0000");
        assert_eq!(deviation_colour(400, 100), "#ff0000");
        assert_eq!(deviation_colour(0, 0), "#00ff00");
    }

    #[test]
    fn histogram_counts_every_value_in_range() {
        let histogram = Histogram::new(&[0, 1, 1, 3, 9], 0, 3, 1);
        let counts: Vec<usize> = histogram.buckets().iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 0, 1]);
        assert_eq!(histogram.buckets()[2].value, 2);
        assert_eq!(histogram.to_svg().matches("<title>").count(), 4);
    }

    #[test]
    fn plot_points_pair_index_and_value() {
        let plot = Plot::new(&[5, 7, 2]);
        assert_eq!(plot.points(), "0,5 1,7 2,2");
        assert!(plot.to_svg().contains(r#"points="0,5 1,7 2,2""#));
    }
}
