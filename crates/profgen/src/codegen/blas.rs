use std::collections::BTreeSet;

use tracing::trace;

use crate::model::BlasRoutine;

use super::ir::Item;

pub(super) const BLAS_NAMESPACE: &str = "BLAS";

fn extern_signature(routine: BlasRoutine) -> &'static str {
    match routine {
        BlasRoutine::Gemm => {
            "void sgemm_(const char* transa, const char* transb, const int* m, const int* n, \
             const int* k, const float* alpha, const float* A, const int* lda, const float* B, \
             const int* ldb, const float* beta, float* C, const int* ldc)"
        }
        BlasRoutine::Gemv => {
            "void sgemv_(const char* trans, const int* m, const int* n, const float* alpha, \
             const float* A, const int* lda, const float* X, const int* incx, const float* beta, \
             float* Y, const int* incy)"
        }
        BlasRoutine::Axpy => {
            "void saxpy_(const int* n, const float* alpha, const float* x, const int* incx, \
             float* y, const int* incy)"
        }
    }
}

/// `namespace BLAS { extern "C" ... }` with one declaration per distinct known
/// routine, or `None` when the graph needs none.
pub(super) fn emit_blas_declarations(routines: &[String]) -> Option<Item> {
    let mut known = BTreeSet::new();
    for id in routines {
        match BlasRoutine::from_name(id) {
            Some(routine) => {
                known.insert(routine);
            }
            None => trace!(routine = %id, "ignoring unknown external routine"),
        }
    }
    if known.is_empty() {
        return None;
    }
    let items = known
        .into_iter()
        .map(|routine| Item::ExternC {
            signature: extern_signature(routine).to_string(),
        })
        .collect();
    Some(Item::Namespace {
        name: BLAS_NAMESPACE.to_string(),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(routines: &[&str]) -> Vec<String> {
        routines.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn declarations_are_deduplicated_and_ordered() {
        let item = emit_blas_declarations(&names(&["Axpy", "Gemm", "Axpy"])).expect("scope");
        let Item::Namespace { name, items } = item else {
            panic!("expected namespace");
        };
        assert_eq!(name, "BLAS");
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], Item::ExternC { signature } if signature.contains("sgemm_(")));
        assert!(matches!(&items[1], Item::ExternC { signature } if signature.contains("saxpy_(")));
    }

    #[test]
    fn unknown_or_missing_routines_omit_the_scope() {
        assert!(emit_blas_declarations(&[]).is_none());
        assert!(emit_blas_declarations(&names(&["Trsm", "Conv"])).is_none());
    }

    #[test]
    fn gemv_uses_fortran_pointer_convention() {
        let sig = extern_signature(BlasRoutine::Gemv);
        assert!(sig.starts_with("void sgemv_(const char* trans, const int* m"));
        assert!(sig.ends_with("float* Y, const int* incy)"));
    }
}
