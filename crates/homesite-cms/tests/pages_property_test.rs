//! Property-based tests for the page tree and stream fields

use homesite_cms::blocks::{BlockKind, ContentBlock, StreamField};
use homesite_cms::error::CmsError;
use homesite_cms::pages::PageTree;
use proptest::prelude::*;
use uuid::Uuid;

fn content_strategy() -> impl Strategy<Value = ContentBlock> {
	prop_oneof![
		"[a-zA-Z <>/]{0,40}".prop_map(ContentBlock::text),
		any::<u128>().prop_map(|n| ContentBlock::image(Uuid::from_u128(n))),
	]
}

proptest! {
	#[test]
	fn prop_page_child_depth_equals_parent_plus_one(
		parent_slug in "[a-z]{1,30}",
		child_slug in "[a-z]{1,30}",
	) {
		let rt = tokio::runtime::Runtime::new().unwrap();

		// Arrange & Act
		let (parent, child) = rt.block_on(async {
			let mut tree = PageTree::new();
			let parent = tree
				.add_page(None, parent_slug.clone(), parent_slug)
				.await
				.unwrap();
			let child = tree
				.add_page(Some(parent.id), child_slug.clone(), child_slug)
				.await
				.unwrap();
			(parent, child)
		});

		// Assert
		prop_assert_eq!(child.depth, parent.depth + 1);
		prop_assert!(child.path.starts_with('/'));
		let expected_path = format!("{}/{}", parent.path, child.slug);
		prop_assert_eq!(child.path, expected_path);
	}

	#[test]
	fn prop_duplicate_sibling_slug_rejected(slug in "[a-z]{1,30}") {
		let rt = tokio::runtime::Runtime::new().unwrap();

		// Arrange & Act
		let result = rt.block_on(async {
			let mut tree = PageTree::new();
			tree.add_page(None, "First".to_string(), slug.clone()).await.unwrap();
			tree.add_page(None, "Second".to_string(), slug).await
		});

		// Assert
		prop_assert!(matches!(result, Err(CmsError::DuplicateSlug(_))));
	}

	#[test]
	fn prop_move_under_descendant_rejected(depth in 1usize..6) {
		let rt = tokio::runtime::Runtime::new().unwrap();

		// Arrange
		let (result, root_path) = rt.block_on(async {
			let mut tree = PageTree::new();
			let root = tree
				.add_page(None, "Root".to_string(), "root".to_string())
				.await
				.unwrap();
			let mut deepest = root.id;
			for level in 0..depth {
				let slug = format!("level-{level}");
				deepest = tree
					.add_page(Some(deepest), slug.clone(), slug)
					.await
					.unwrap()
					.id;
			}

			// Act
			let result = tree.move_page(root.id, Some(deepest), None).await;
			(result, tree.get(root.id).unwrap().path.clone())
		});

		// Assert
		prop_assert!(matches!(result, Err(CmsError::InvalidHierarchy(_))));
		prop_assert_eq!(root_path, "/root");
	}

	#[test]
	fn prop_reorder_keeps_sibling_set(count in 2usize..8, from in 0usize..8, to in 0usize..8) {
		let rt = tokio::runtime::Runtime::new().unwrap();
		let from = from % count;
		let to = to % count;

		// Arrange & Act
		let (before, after) = rt.block_on(async {
			let mut tree = PageTree::new();
			let parent = tree
				.add_page(None, "Parent".to_string(), "parent".to_string())
				.await
				.unwrap();
			for i in 0..count {
				let slug = format!("child-{i}");
				tree.add_page(Some(parent.id), slug.clone(), slug).await.unwrap();
			}
			let before: Vec<Uuid> = tree.children(Some(parent.id)).iter().map(|n| n.id).collect();
			tree.reorder(before[from], to).await.unwrap();
			let after: Vec<Uuid> = tree.children(Some(parent.id)).iter().map(|n| n.id).collect();
			(before, after)
		});

		// Assert
		let mut expected = before.clone();
		let moved = expected.remove(from);
		expected.insert(to, moved);
		prop_assert_eq!(after, expected);
	}

	#[test]
	fn prop_stream_order_survives_serialization(
		contents in proptest::collection::vec(content_strategy(), 0..12),
	) {
		// Arrange
		let field = StreamField::from_contents(contents.clone());

		// Act
		let json = serde_json::to_string(&field).unwrap();
		let read: StreamField = serde_json::from_str(&json).unwrap();

		// Assert
		let read_contents: Vec<ContentBlock> = read.iter().map(|b| b.content.clone()).collect();
		prop_assert_eq!(read_contents, contents);
		prop_assert_eq!(read, field);
	}

	#[test]
	fn prop_moving_a_block_preserves_the_others(
		contents in proptest::collection::vec(content_strategy(), 1..10),
		from in 0usize..10,
		to in 0usize..10,
	) {
		// Arrange
		let mut field = StreamField::from_contents(contents);
		let from = from % field.len();
		let to = to % field.len();
		let mut expected: Vec<Uuid> = field.iter().map(|b| b.id).collect();
		let moved = expected.remove(from);
		expected.insert(to, moved);

		// Act
		field.move_block(moved, to).unwrap();

		// Assert
		let ids: Vec<Uuid> = field.iter().map(|b| b.id).collect();
		prop_assert_eq!(ids, expected);
	}

	#[test]
	fn prop_image_ids_follow_block_order(
		contents in proptest::collection::vec(content_strategy(), 0..12),
	) {
		// Arrange
		let field = StreamField::from_contents(contents.clone());

		// Act
		let ids = field.image_ids();

		// Assert
		let expected: Vec<Uuid> = contents
			.iter()
			.filter(|c| c.kind() == BlockKind::Image)
			.filter_map(|c| match c {
				ContentBlock::Image(id) => Some(*id),
				ContentBlock::Text(_) => None,
			})
			.collect();
		prop_assert_eq!(ids, expected);
	}
}
