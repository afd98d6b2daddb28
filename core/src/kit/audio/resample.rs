use std::f32::consts::PI;

/// Highest frequency kept when resampling, before the Nyquist guard band.
const MAX_PASSBAND: f32 = 20000.0;

fn gen_resample_lookup_table(resolution: usize, fmax: f32, fsr: f32, wnwidth: i32) -> Vec<f32> {
    let r_g = 2.0 * fmax / fsr;
    let mut lookup_table = Vec::new();
    for x in 0..resolution {
        let x = x as f32 / resolution as f32;
        for i in (-wnwidth / 2)..(wnwidth / 2 - 1) {
            let j_x = i as f32 - x;
            let r_a = 2.0 * PI * j_x * fmax / fsr;
            let r_w = 0.5 - 0.5 * (2.0 * PI * (0.5 + j_x / wnwidth as f32)).cos();
            let r_snc = if r_a != 0.0 { r_a.sin() / r_a } else { 1.0 };
            lookup_table.push(r_g * r_w * r_snc);
        }
    }
    lookup_table
}

/// Windowed-sinc resampler with a precomputed kernel table, used to bring
/// every decoded sample to the output stream's rate at load time.
pub struct SincResampler {
    source_rate: f32,
    target_rate: f32,
    resolution: usize,
    offset: i32,
    stride: usize,
    lookup_table: Vec<f32>,
}

impl SincResampler {
    pub fn new(resolution: usize, source_rate: u32, target_rate: u32, wnwidth: i32) -> Self {
        let (source, target) = (source_rate as f32, target_rate as f32);
        // Cut below the lower of the two Nyquist frequencies
        let fmax = MAX_PASSBAND.min(source.min(target) * 0.45);
        let lookup_table = gen_resample_lookup_table(resolution, fmax, source, wnwidth);
        SincResampler {
            source_rate: source,
            target_rate: target,
            resolution,
            offset: wnwidth / 2,
            stride: ((wnwidth / 2 - 1) - (-wnwidth / 2)) as usize,
            lookup_table,
        }
    }

    /// Number of frames `frames` source frames become after resampling.
    pub fn resampled_len(&self, frames: usize) -> usize {
        (frames as f64 * self.target_rate as f64 / self.source_rate as f64).round() as usize
    }

    pub fn resample_vec(&self, indata: &[f32]) -> Vec<f32> {
        let new_len = self.resampled_len(indata.len());
        let mut outdata = Vec::with_capacity(new_len);

        let rate_fac = self.source_rate as f64 / self.target_rate as f64;
        for s in 0..new_len {
            let x = s as f64 * rate_fac;
            let whole = x as i32;
            let res_index =
                (((x - whole as f64) * self.resolution as f64) as usize).min(self.resolution - 1);
            let table = &self.lookup_table[res_index * self.stride..(res_index + 1) * self.stride];

            let mut r_y = 0.0;
            for (p, coefficient) in table.iter().enumerate() {
                let j = whole + p as i32 - self.offset;
                if j >= 0 && (j as usize) < indata.len() {
                    r_y += coefficient * indata[j as usize];
                }
            }
            outdata.push(r_y);
        }

        outdata
    }
}
