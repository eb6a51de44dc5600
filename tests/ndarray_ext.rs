//! Integration tests for ndarray support
//!
//! These tests demonstrate moving decoded payloads into ndarray for
//! numerical work.

#![cfg(feature = "ndarray")]

use ndarray::{ArrayD, IxDyn, array};
use zanj::{DType, NdArray, NdarrayError, parse};

fn make_npy(header: &str, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(zanj::types::MAGIC);
    bytes.push(1);
    bytes.push(0);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(data);
    bytes
}

// =============================================================================
// Basic roundtrips
// =============================================================================

#[test]
fn roundtrip_ndarray_1d() {
    let arr = array![1.0f32, 2.0, 3.0, 4.0, 5.0].into_dyn();
    let expected = arr.clone();

    let nd = NdArray::from_ndarray(arr).unwrap();
    assert_eq!(nd.dtype(), DType::F32);

    let back: ArrayD<f32> = nd.to_ndarray().unwrap();
    assert_eq!(expected, back);
}

#[test]
fn roundtrip_ndarray_2d_matrix() {
    let matrix = array![[1.0f64, 2.0, 3.0], [4.0, 5.0, 6.0]].into_dyn();
    let expected = matrix.clone();

    let nd = NdArray::from_ndarray(matrix).unwrap();
    assert_eq!(nd.shape(), &[2, 3]);

    let back: ArrayD<f64> = nd.to_ndarray().unwrap();
    assert_eq!(expected, back);
}

#[test]
fn roundtrip_high_rank() {
    let arr = ArrayD::<i32>::zeros(IxDyn(&[2, 2, 2, 2]));
    let nd = NdArray::from_ndarray(arr.clone()).unwrap();
    assert_eq!(nd.ndim(), 4);
    let back: ArrayD<i32> = nd.to_ndarray().unwrap();
    assert_eq!(arr, back);
}

// =============================================================================
// Decoded payloads into ndarray
// =============================================================================

#[test]
fn parsed_npy_into_ndarray() {
    let data: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]
        .iter()
        .flat_map(|f| f.to_le_bytes())
        .collect();
    let bytes = make_npy(
        "{'descr': '<f4', 'fortran_order': False, 'shape': (2, 3), }",
        &data,
    );
    let nd = parse(&bytes).unwrap();

    let matrix: ArrayD<f32> = nd.to_ndarray().unwrap();
    assert_eq!(matrix.shape(), &[2, 3]);
    assert_eq!(matrix[[1, 2]], 6.0);
    assert_eq!(matrix.sum(), 21.0);
}

#[test]
fn inline_array_into_ndarray() {
    let v = serde_json::json!({
        "__muutils_format__": "numpy.ndarray:array_b64_meta",
        "shape": [2, 2],
        "dtype": "uint8",
        "data": "AQIDBA==",
    });
    let nd = zanj::inline::decode(&v).unwrap().unwrap();
    let grid: ArrayD<u8> = nd.to_ndarray().unwrap();
    assert_eq!(grid[[0, 0]], 1);
    assert_eq!(grid[[1, 1]], 4);
}

// =============================================================================
// Error cases
// =============================================================================

#[test]
fn dtype_mismatch_is_reported() {
    let nd = NdArray::from_ndarray(array![1.0f32, 2.0].into_dyn()).unwrap();
    let result: Result<ArrayD<i32>, _> = nd.to_ndarray();
    assert_eq!(
        result.unwrap_err(),
        NdarrayError::DTypeMismatch {
            expected: DType::I32,
            actual: DType::F32
        }
    );
}

#[test]
fn non_contiguous_input_is_rejected() {
    let arr = ArrayD::<f64>::zeros(IxDyn(&[4, 4]));
    let transposed = arr.t().into_owned().into_dyn();
    // owned transpose is contiguous again, so this succeeds
    assert!(NdArray::from_ndarray(transposed).is_ok());

    let arr2 = ArrayD::<f64>::zeros(IxDyn(&[4, 4]));
    let view = arr2.t();
    if !view.is_standard_layout() {
        // a genuinely reversed-stride array converts only after relayout
        let relaid = view.as_standard_layout().into_owned();
        assert!(NdArray::from_ndarray(relaid).is_ok());
    }
}
