use image::{Rgb, RgbImage};

/// Extend `image` by `padding` pixels on every side.
///
/// Each border strip repeats the mean color of the original edge row or column
/// it touches. Corner blocks take the channel average of the nearest original
/// corner pixel, as a gray value.
pub fn pad_image(image: &RgbImage, padding: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let p = padding;
    let mut padded = RgbImage::new(width + 2 * p, height + 2 * p);

    if width == 0 || height == 0 {
        return padded;
    }

    image::imageops::replace(&mut padded, image, i64::from(p), i64::from(p));

    if p == 0 {
        return padded;
    }

    let top = mean_color((0..width).map(|x| image.get_pixel(x, 0)));
    let bottom = mean_color((0..width).map(|x| image.get_pixel(x, height - 1)));
    let left = mean_color((0..height).map(|y| image.get_pixel(0, y)));
    let right = mean_color((0..height).map(|y| image.get_pixel(width - 1, y)));

    for i in 0..p {
        for x in 0..width {
            padded.put_pixel(p + x, i, top);
            padded.put_pixel(p + x, height + 2 * p - 1 - i, bottom);
        }
        for y in 0..height {
            padded.put_pixel(i, p + y, left);
            padded.put_pixel(width + 2 * p - 1 - i, p + y, right);
        }
    }

    let corners = [
        (0, 0, image.get_pixel(0, 0)),
        (width + p, 0, image.get_pixel(width - 1, 0)),
        (0, height + p, image.get_pixel(0, height - 1)),
        (width + p, height + p, image.get_pixel(width - 1, height - 1)),
    ];
    for (x0, y0, pixel) in corners {
        let gray = pixel_average(pixel);
        let fill = Rgb([gray, gray, gray]);
        for y in y0..y0 + p {
            for x in x0..x0 + p {
                padded.put_pixel(x, y, fill);
            }
        }
    }

    padded
}

/// Per-channel mean, truncated to `u8`.
fn mean_color<'a>(pixels: impl Iterator<Item = &'a Rgb<u8>>) -> Rgb<u8> {
    let mut sums = [0u64; 3];
    let mut count = 0u64;
    for pixel in pixels {
        for (sum, &value) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += u64::from(value);
        }
        count += 1;
    }
    if count == 0 {
        return Rgb([0, 0, 0]);
    }
    Rgb(sums.map(|sum| (sum / count) as u8))
}

fn pixel_average(pixel: &Rgb<u8>) -> u8 {
    let sum: u32 = pixel.0.iter().map(|&v| u32::from(v)).sum();
    (sum / 3) as u8
}
