use pretty_assertions::assert_eq;
use test_env_log::test;

use crate::*;

fn assert_heap_empty(heap: &Heap) {
    let stats = heap.stats();
    assert_eq!(stats.live_allocations, 0, "leaked allocations: {:?}", stats);
    assert_eq!(stats.allocations, stats.releases);
}

fn int_vector(heap: &Heap, values: &[i32]) -> Obj {
    let obj = heap.create_vector(values.len().max(1)).expect("vector");
    let v = obj.as_vector().expect("is a vector");
    for &i in values {
        v.push_back(heap.create_int(i).expect("int")).expect("push");
    }
    obj
}

#[test]
fn test_scalars() {
    let heap = Heap::new();
    let i = heap.create_int(-42).expect("int");
    let f = heap.create_float(2.5).expect("float");

    assert_eq!(i.obj_type(), ObjType::Int);
    assert_eq!(i.as_int(), Some(-42));
    assert_eq!(i.as_float(), None, "no coercion between variants");
    assert_eq!(f.as_float(), Some(2.5));
    assert!(f.is_float());
    assert_eq!(i.ref_count(), 1);
    assert_eq!(heap.live(AllocKind::Node), 2);

    assert_eq!(i.release(), Release::Freed);
    assert_eq!(f.release(), Release::Freed);
    assert_heap_empty(&heap);
}

#[test]
fn test_string_owns_terminated_copy() {
    let heap = Heap::new();
    let text = String::from("abc");
    let s = heap.create_string(&text).expect("string");
    drop(text);

    assert_eq!(s.as_str(), Some("abc"));
    match s.data() {
        ObjData::String(buf) => assert_eq!(buf.as_bytes_with_nul(), b"abc\0"),
        _ => panic!("expected a string"),
    }
    assert_eq!(heap.live(AllocKind::StringBuffer), 1);

    drop(s);
    assert_heap_empty(&heap);
}

#[test]
fn test_string_rejects_nul() {
    let heap = Heap::new();
    assert!(matches!(
        heap.create_string("a\0b"),
        Err(ObjError::InvalidArgument(_))
    ));
    assert_heap_empty(&heap);

    let empty = heap.create_string("").expect("empty strings are fine");
    assert_eq!(empty.as_str(), Some(""));
}

#[test]
fn test_tuple_requires_both_elements() {
    let heap = Heap::new();

    let y = heap.create_int(2).expect("int");
    let rejected = heap.create_tuple(None, Some(y)).expect_err("x is absent");
    assert!(matches!(rejected.error(), ObjError::InvalidArgument(_)));
    let (x, y) = rejected.into_value();
    assert!(x.is_none());
    let y = y.expect("y is handed back");
    assert_eq!(y.as_int(), Some(2), "caller still owns a valid y");

    let rejected = heap.create_tuple(Some(y), None).expect_err("y is absent");
    let (x, _) = rejected.into_value();
    assert_eq!(Obj::release_opt(x), Some(Release::Freed));
    assert_eq!(Obj::release_opt(None), None, "releasing nothing is a no-op");

    assert_heap_empty(&heap);
}

#[test]
fn test_tuple_takes_ownership() {
    let heap = Heap::new();
    let x = heap.create_int(1).expect("int");
    let y = heap.create_string("s").expect("string");
    let t = heap.create_tuple(Some(x), Some(y)).expect("tuple");

    let pair = t.as_tuple().expect("is a tuple");
    assert_eq!(pair.x().as_int(), Some(1));
    assert_eq!(pair.y().as_str(), Some("s"));
    assert_eq!(heap.stats().live_allocations, 4);

    assert_eq!(t.release(), Release::Freed);
    assert_heap_empty(&heap);
}

#[test]
fn test_try_into_tuple() {
    let heap = Heap::new();
    let t = heap
        .create_tuple(
            Some(heap.create_int(1).expect("int")),
            Some(heap.create_int(2).expect("int")),
        )
        .expect("tuple");

    let other_owner = t.acquire();
    let t = t.try_into_tuple().expect_err("still shared");
    drop(other_owner);

    let (x, y) = t.try_into_tuple().expect("unique tuple");
    assert_eq!((x.as_int(), y.as_int()), (Some(1), Some(2)));
    assert_eq!(heap.live(AllocKind::Node), 2, "only the tuple node was freed");

    let not_a_tuple = x.try_into_tuple().expect_err("an int");
    assert_eq!(not_a_tuple.as_int(), Some(1));
    drop((not_a_tuple, y));
    assert_heap_empty(&heap);
}

#[test]
fn test_vector_requires_capacity() {
    let heap = Heap::new();
    assert_eq!(
        heap.create_vector(0).err(),
        Some(ObjError::InvalidArgument("vector capacity is zero"))
    );
    assert_heap_empty(&heap);
}

#[test]
fn test_vector_positional_access() {
    let heap = Heap::new();
    let obj = int_vector(&heap, &[10, 20, 30]);
    let v = obj.as_vector().expect("is a vector");

    assert_eq!(v.len(), 3);
    assert_eq!(v.at(2).expect("last").map(|o| o.as_int()), Some(Some(30)));
    assert_eq!(
        v.at(3).err(),
        Some(ObjError::IndexOutOfRange { pos: 3, len: 3 })
    );
    assert_eq!(v.front().expect("front").and_then(|o| o.as_int()), Some(10));
    assert_eq!(v.back().expect("back").and_then(|o| o.as_int()), Some(30));
}

#[test]
fn test_vector_insert_and_remove() {
    let heap = Heap::new();
    let obj = int_vector(&heap, &[1, 3]);
    let v = obj.as_vector().expect("is a vector");

    v.insert(1, heap.create_int(2).expect("int")).expect("insert");
    v.insert(3, heap.create_int(4).expect("int")).expect("append");
    assert_eq!(render(&obj), "LEN: {4} [1, 2, 3, 4]");

    let rejected = v
        .insert(9, heap.create_int(5).expect("int"))
        .expect_err("past the end");
    assert_eq!(
        *rejected.error(),
        ObjError::IndexOutOfRange { pos: 9, len: 4 }
    );
    assert_eq!(rejected.into_value().as_int(), Some(5));

    let removed = v.remove(0).expect("remove").expect("occupied");
    assert_eq!(removed.as_int(), Some(1));
    assert_eq!(render(&obj), "LEN: {3} [2, 3, 4]");

    let popped = v.pop_back().expect("pop").expect("occupied");
    assert_eq!(popped.as_int(), Some(4));
    assert_eq!(popped.ref_count(), 1, "caller is the sole owner");

    drop((removed, popped, obj));
    assert_heap_empty(&heap);
}

#[test]
fn test_vector_pop_empty() {
    let heap = Heap::new();
    let obj = heap.create_vector(1).expect("vector");
    let v = obj.as_vector().expect("is a vector");
    assert_eq!(
        v.pop_back().err(),
        Some(ObjError::IndexOutOfRange { pos: 0, len: 0 })
    );
    assert!(v.front().is_err());
    assert_eq!(
        v.back().err(),
        Some(ObjError::IndexOutOfRange { pos: 0, len: 0 })
    );
    assert!(v.at(0).is_err());
}

#[test]
fn test_vector_duplicates_own_element() {
    let heap = Heap::new();
    let obj = int_vector(&heap, &[7]);
    let v = obj.as_vector().expect("is a vector");

    // Reading and growing in one statement: `at` hands out an owner, so the
    // vector is not borrowed while it grows.
    v.push_back(v.at(0).expect("in range").expect("occupied"))
        .expect("push");
    v.insert(0, v.back().expect("back").expect("occupied"))
        .expect("insert");
    assert_eq!(render(&obj), "LEN: {3} [7, 7, 7]");

    let first = v.front().expect("front").expect("occupied");
    assert_eq!(first.ref_count(), 4, "three slots and the local handle");
    drop((first, obj));
    assert_heap_empty(&heap);
}

#[test]
fn test_vector_edit_while_reading_is_an_error() {
    let heap = Heap::new();
    let obj = int_vector(&heap, &[1, 2]);
    let v = obj.as_vector().expect("is a vector");

    let reading = v.slots().expect("not being modified");
    assert_eq!(reading.present().count(), 2);
    let rejected = v
        .push_back(heap.create_int(3).expect("int"))
        .expect_err("vector is borrowed");
    assert!(matches!(rejected.error(), ObjError::InvalidArgument(_)));
    assert!(matches!(v.pop_back(), Err(ObjError::InvalidArgument(_))));
    assert_eq!(v.at(1).expect("reads still work").and_then(|o| o.as_int()), Some(2));
    drop(reading);

    v.push_back(rejected.into_value()).expect("push");
    assert_eq!(render(&obj), "LEN: {3} [1, 2, 3]");
    drop(obj);
    assert_heap_empty(&heap);
}

#[test]
fn test_vector_take_and_replace() {
    let heap = Heap::new();
    let obj = int_vector(&heap, &[1, 2, 3]);
    let v = obj.as_vector().expect("is a vector");

    let taken = v.take(1).expect("take").expect("occupied");
    assert_eq!(taken.as_int(), Some(2));
    assert!(v.at(1).expect("in range").is_none(), "slot is absent");
    assert_eq!(v.len(), 3);

    let previous = v.replace(1, taken).expect("replace");
    assert!(previous.is_none());
    let previous = v
        .replace(0, heap.create_int(9).expect("int"))
        .expect("replace");
    assert_eq!(previous.and_then(|o| o.as_int()), Some(1));
    assert_eq!(render(&obj), "LEN: {3} [9, 2, 3]");

    drop(obj);
    assert_heap_empty(&heap);
}

#[test]
fn test_vector_grows() {
    let heap = Heap::new();
    let obj = heap.create_vector(1).expect("vector");
    let v = obj.as_vector().expect("is a vector");
    for i in 0..100 {
        v.push_back(heap.create_int(i).expect("int")).expect("push");
    }
    assert_eq!(v.len(), 100);
    assert!(v.capacity() >= 100);
    assert_eq!(
        heap.live(AllocKind::Container),
        1,
        "grown storage replaces the old registration"
    );

    drop(obj);
    assert_heap_empty(&heap);
}

#[test]
fn test_vector_growth_failure_hands_back_element() {
    // Room for a one-slot vector holding one int, plus one spare node, but not
    // for grown storage.
    let budget = Obj::NODE_SIZE * 3 + SlotVec::<Obj>::byte_size(1);
    let heap = Heap::with_config(HeapConfig::new().with_max_bytes(budget));

    let obj = heap.create_vector(1).expect("vector");
    let v = obj.as_vector().expect("is a vector");
    v.push_back(heap.create_int(0).expect("int")).expect("fits");
    let extra = heap.create_int(1).expect("one more node fits");

    let rejected = v.push_back(extra).expect_err("storage cannot grow");
    assert!(matches!(
        rejected.error(),
        ObjError::AllocationError { .. }
    ));
    assert_eq!(rejected.into_value().as_int(), Some(1));
    assert_eq!(v.len(), 1, "vector is unchanged");
    assert_eq!(render(&obj), "LEN: {1} [0]");

    drop(obj);
    assert_heap_empty(&heap);
}

#[test]
fn test_construction_failure_leaks_nothing() {
    // Walk the budget up one byte at a time so that every construction step
    // gets to fail at least once.
    let full = Obj::NODE_SIZE * 2 + "text".len() + 1;
    for max_bytes in 0..=full {
        let heap = Heap::with_config(HeapConfig::new().with_max_bytes(max_bytes));
        match heap.create_string("text") {
            Ok(s) => {
                assert!(max_bytes >= Obj::NODE_SIZE + 5);
                drop(s);
            }
            Err(e) => assert!(matches!(e, ObjError::AllocationError { .. })),
        }
        if let Ok(v) = heap.create_vector(4) {
            drop(v);
        }
        let x = heap.create_int(1).ok();
        let y = heap.create_float(1.0).ok();
        match heap.create_tuple(x, y) {
            Ok(t) => drop(t),
            Err(rejected) => drop(rejected.into_value()),
        }
        assert_heap_empty(&heap);
    }
}

#[test]
fn test_shared_vector_survives_first_release() {
    let heap = Heap::new();
    let first = int_vector(&heap, &[1, 2]);
    let second = first.acquire();
    assert_eq!(first.ref_count(), 2);
    assert!(first.ptr_eq(&second));

    assert_eq!(first.release(), Release::Shared(1));
    assert_eq!(render(&second), "LEN: {2} [1, 2]");
    assert_eq!(heap.live(AllocKind::Node), 3, "nothing was freed");

    assert_eq!(second.release(), Release::Freed);
    assert_heap_empty(&heap);
}

#[test]
fn test_shared_element_in_two_vectors() {
    let heap = Heap::new();
    let shared = heap.create_string("shared").expect("string");
    let a = int_vector(&heap, &[]);
    let b = int_vector(&heap, &[]);
    a.as_vector()
        .expect("is a vector")
        .push_back(shared.acquire())
        .expect("push");
    b.as_vector()
        .expect("is a vector")
        .push_back(shared)
        .expect("push");

    drop(a);
    assert_eq!(render(&b), r#"LEN: {1} ["shared"]"#);
    assert_eq!(heap.live(AllocKind::StringBuffer), 1);
    drop(b);
    assert_heap_empty(&heap);
}

#[test]
fn test_cycles_are_rejected() {
    let heap = Heap::new();
    let outer = int_vector(&heap, &[]);
    let ov = outer.as_vector().expect("is a vector");

    let rejected = ov.push_back(outer.acquire()).expect_err("self insertion");
    assert!(matches!(rejected.error(), ObjError::InvalidArgument(_)));
    drop(rejected);
    assert_eq!(outer.ref_count(), 1);

    let inner = int_vector(&heap, &[]);
    ov.push_back(inner.acquire()).expect("acyclic");

    let wrapped = heap
        .create_tuple(Some(heap.create_int(0).expect("int")), Some(outer.acquire()))
        .expect("tuple");
    let iv = inner.as_vector().expect("is a vector");
    let rejected = iv.push_back(wrapped).expect_err("inner reaches outer");
    drop(rejected);
    assert!(iv.insert(0, outer.acquire()).is_err());
    assert!(iv.is_empty());

    drop((outer, inner));
    assert_heap_empty(&heap);
}
