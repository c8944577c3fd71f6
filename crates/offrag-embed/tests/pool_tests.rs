use candle_core::{DType, Device, Tensor};
use offrag_embed::masked_mean_l2;

#[test]
fn masked_mean_l2_skips_padding() {
    let dev = Device::Cpu;
    // Two tokens with hidden dim 4; second token is padding.
    let h = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0,
                                 5.0, 6.0, 7.0, 8.0],
                               (1, 2, 4), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0u32], (1, 2), &dev).unwrap();
    let out = masked_mean_l2(&h, &mask).unwrap();
    let v: Vec<Vec<f32>> = out.to_vec2().unwrap();
    let norm: f32 = (1.0f32 + 4.0 + 9.0 + 16.0).sqrt();
    let expected = [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm];
    for (a, b) in v[0].iter().cloned().zip(expected) {
        assert!((a - b).abs() < 1e-5, "a={} b={}", a, b);
    }
}

#[test]
fn fully_padded_row_does_not_divide_by_zero() {
    let dev = Device::Cpu;
    let h = Tensor::ones((2, 3, 4), DType::F32, &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 1, 1, 0, 0, 0], (2, 3), &dev).unwrap();
    let out: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();
    assert_eq!(out.len(), 2);
    assert!(out[1].iter().all(|x| x.is_finite()));
}
