/// Regular grid of roughly `samples` pixel locations `(x, y)` spread over the
/// whole image, with the grid's aspect ratio following the image.
pub fn stratified_locations(width: usize, height: usize, samples: usize) -> Vec<(usize, usize)> {
    if width == 0 || height == 0 || samples == 0 {
        return Vec::new();
    }
    let samples = samples.min(width * height);
    let aspect = width as f64 / height as f64;
    let x_points = ((samples as f64 * aspect).sqrt() as usize).clamp(1, width);
    let y_points = (samples / x_points).clamp(1, height);
    let step_x = width / x_points;
    let step_y = height / y_points;

    let mut locations = Vec::with_capacity(x_points * y_points);
    for j in 0..y_points {
        let y = step_y / 2 + j * step_y;
        for i in 0..x_points {
            let x = step_x / 2 + i * step_x;
            locations.push((x, y));
        }
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_follows_aspect_ratio() {
        let locations = stratified_locations(64, 48, 200);
        assert_eq!(locations.len(), 16 * 12);
        assert_eq!(locations[0], (2, 2));
        assert_eq!(*locations.last().unwrap(), (62, 46));
    }

    #[test]
    fn stays_inside_tiny_images() {
        let locations = stratified_locations(3, 2, 500);
        assert!(!locations.is_empty());
        assert!(locations.len() <= 6);
        assert!(locations.iter().all(|&(x, y)| x < 3 && y < 2));
    }

    #[test]
    fn locations_are_distinct() {
        let mut locations = stratified_locations(100, 30, 120);
        let n = locations.len();
        locations.sort();
        locations.dedup();
        assert_eq!(locations.len(), n);
    }
}
